//! Request gateway that runs before routing.
//!
//! Only checks the token signature, with the digest-only codec. Protected API
//! routes are guarded again by [`require_auth`], which also confirms the
//! account exists.
//!
//! [`require_auth`]: crate::middleware_layer::auth::require_auth

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;
use url::form_urlencoded;

use crate::{
    crypto::token::SessionCodec,
    error::error_body,
    middleware_layer::auth::extract_session_token,
    state::AppState,
};

/// Paths reachable without a session.
pub fn is_public_path(path: &str) -> bool {
    matches!(
        path,
        "/login" | "/signup" | "/api/auth/login" | "/api/auth/logout" | "/api/auth/signup"
    ) || path.starts_with("/assets/")
        || path.contains('.')
}

fn is_api_path(path: &str) -> bool {
    path.starts_with("/api/")
}

/// The login page URL that returns the user to `path` afterwards.
pub fn login_redirect_target(path: &str) -> String {
    let from: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("/login?from={}", from)
}

/// Decides whether a request may continue past the gateway.
///
/// Returns `None` to let the request through, or the response that ends it:
/// `401` for API paths and a login redirect for pages when the token is
/// invalid, `500` (API) or a plain login redirect when the codec fails.
pub fn check_session<C: SessionCodec>(
    codec: &C,
    path: &str,
    token: Option<&str>,
) -> Option<Response> {
    if is_public_path(path) {
        return None;
    }

    match codec.verify(token) {
        Ok(_) => None,
        Err(e) if e.is_invalid() => {
            tracing::debug!("🚫 Gateway rejected unauthenticated request to {}", path);
            let response = if is_api_path(path) {
                error_body(StatusCode::UNAUTHORIZED, "Unauthorized")
            } else {
                Redirect::temporary(&login_redirect_target(path)).into_response()
            };
            Some(response)
        }
        Err(e) => {
            tracing::error!("🚨 Gateway session codec failure on {}: {}", path, e);
            let response = if is_api_path(path) {
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            } else {
                Redirect::temporary("/login").into_response()
            };
            Some(response)
        }
    }
}

/// Rejects unauthenticated requests to protected paths.
pub async fn gate(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_session_token(&cookies);
    match check_session(&state.edge_sessions, request.uri().path(), token.as_deref()) {
        Some(rejection) => rejection,
        None => next.run(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    use crate::crypto::digest_codec::DigestCodec;
    use crate::crypto::secret::SessionSecret;
    use crate::crypto::token::TokenError;

    /// A codec whose MAC primitive is gone.
    struct BrokenCodec;

    impl SessionCodec for BrokenCodec {
        fn sign(&self, _subject: &str) -> Result<String, TokenError> {
            Err(TokenError::PrimitiveUnavailable("no SHA-256 available".to_string()))
        }

        fn signatures_match(&self, _provided: &str, _expected: &str) -> bool {
            false
        }
    }

    async fn json_error(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn codec_failure_on_api_path_is_a_server_error() {
        let response = check_session(&BrokenCodec, "/api/auth/me", Some("user-42.abcd")).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(json_error(response).await["error"], "Internal Server Error");
    }

    #[test]
    fn codec_failure_on_page_redirects_to_plain_login() {
        let response = check_session(&BrokenCodec, "/calendar", Some("user-42.abcd")).unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized_not_a_server_error() {
        let codec = DigestCodec::new(SessionSecret::new("test-secret"));
        let response = check_session(&codec, "/api/auth/me", Some("user-42.abcd")).unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_error(response).await["error"], "Unauthorized");

        let page = check_session(&codec, "/calendar", None).unwrap();
        assert_eq!(page.headers()[header::LOCATION], "/login?from=%2Fcalendar");
    }

    #[test]
    fn public_and_valid_requests_pass() {
        let codec = DigestCodec::new(SessionSecret::new("test-secret"));
        let token = codec.issue("user-42").unwrap();
        assert!(check_session(&codec, "/calendar", Some(token.as_str())).is_none());
        assert!(check_session(&BrokenCodec, "/login", None).is_none());
    }

    #[test]
    fn public_paths() {
        for path in [
            "/login",
            "/signup",
            "/api/auth/login",
            "/api/auth/logout",
            "/api/auth/signup",
            "/assets/app",
            "/favicon.ico",
        ] {
            assert!(is_public_path(path), "{path}");
        }
    }

    #[test]
    fn protected_paths() {
        for path in ["/", "/calendar", "/api/auth/me", "/api/recipes", "/loginx"] {
            assert!(!is_public_path(path), "{path}");
        }
    }

    #[test]
    fn redirect_target_encodes_origin_path() {
        assert_eq!(login_redirect_target("/calendar"), "/login?from=%2Fcalendar");
        assert_eq!(
            login_redirect_target("/profile/a b"),
            "/login?from=%2Fprofile%2Fa+b"
        );
    }
}
