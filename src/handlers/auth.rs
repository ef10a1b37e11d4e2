use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tower_cookies::{Cookie, Cookies};
use tower_cookies::cookie::time::Duration;
use url::form_urlencoded;

use crate::{
    config::{Config, MAX_SESSION_AGE_DAYS},
    crypto::token::SessionCodec,
    error::{AppError, Result},
    extract::AppJson,
    middleware_layer::auth::SESSION_COOKIE_NAME,
    models::user::{AuthUser, PublicUser, User},
    services::auth as auth_service,
    state::AppState,
    validation::auth::{present, required, validate_password},
};

/// The request payload for signup.
#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub avatar_color: Option<String>,
    pub invite_token: Option<String>,
}

/// The request payload for login.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// The request payload for changing a password.
#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// The response payload for login and signup.
#[derive(Serialize)]
pub struct AuthResponse {
    pub ok: bool,
    pub user: PublicUser,
}

/// The response payload for operations with nothing else to report.
#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// The response payload for the invite link.
#[derive(Serialize)]
pub struct InviteLinkResponse {
    pub link: Option<String>,
}

/// Creates the session cookie carrying `token`.
fn create_session_cookie(token: String, config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, token);

    cookie.set_http_only(true);
    if config.production {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::days(
        config.session_max_age_days.clamp(1, MAX_SESSION_AGE_DAYS),
    ));
    cookie.set_path("/");

    cookie
}

/// Issues a session token for `user` and attaches it as a cookie.
fn start_session(state: &AppState, cookies: &Cookies, user: &User) -> Result<Response> {
    let token = state.sessions.issue(&user.id.to_string())?;
    cookies.add(create_session_cookie(token, &state.config));
    tracing::info!("✅ Session cookie issued for user: {}", user.id);

    Ok(Json(AuthResponse {
        ok: true,
        user: PublicUser::from(user),
    })
    .into_response())
}

/// Whether `provided` matches the configured invite token.
fn invite_accepted(provided: Option<&str>, configured: Option<&str>) -> bool {
    match (provided, configured) {
        (Some(provided), Some(configured)) if !provided.is_empty() => {
            provided.as_bytes().ct_eq(configured.as_bytes()).into()
        }
        _ => false,
    }
}

/// Handles signup with an invite token.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<Response> {
    if !invite_accepted(
        payload.invite_token.as_deref(),
        state.config.invite_token.as_deref(),
    ) {
        return Err(AppError::Forbidden("Invalid invite link".to_string()));
    }

    let (Some(email), Some(password), Some(name)) = (
        required(payload.email.as_deref()),
        present(payload.password.as_deref()),
        required(payload.name.as_deref()),
    ) else {
        return Err(AppError::Validation(
            "Email, password, and name are required".to_string(),
        ));
    };

    validate_password(password, "Password must be at least 6 characters")?;

    tracing::info!("📝 Signup attempt for: {}", email);

    let user = auth_service::register_user(
        &state.users,
        email,
        password,
        name,
        payload.avatar_color.as_deref(),
    )
    .await?;

    start_session(&state, &cookies, &user)
}

/// Handles login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Response> {
    let (Some(email), Some(password)) = (
        required(payload.email.as_deref()),
        present(payload.password.as_deref()),
    ) else {
        return Err(AppError::Validation(
            "Email and password required".to_string(),
        ));
    };

    tracing::info!("🔐 Login attempt for: {}", email);

    let user = auth_service::authenticate_user(&state.users, email, password).await?;

    start_session(&state, &cookies, &user)
}

/// Handles logout by expiring the session cookie.
///
/// Tokens are stateless, so nothing is revoked server side. The expired
/// cookie is sent even when the request carried none.
pub async fn logout(cookies: Cookies) -> Response {
    let mut session_cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    session_cookie.set_max_age(Duration::seconds(0));
    session_cookie.set_path("/");
    cookies.add(session_cookie);

    tracing::info!("👋 Session cookie cleared");

    Redirect::temporary("/login").into_response()
}

/// Returns the authenticated user.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PublicUser>> {
    let user = state
        .users
        .find_by_id(&auth.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(PublicUser::from(&user)))
}

/// Handles changing the authenticated user's password.
#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<OkResponse>> {
    let (Some(current), Some(new)) = (
        present(payload.current_password.as_deref()),
        present(payload.new_password.as_deref()),
    ) else {
        return Err(AppError::Validation("Both passwords required".to_string()));
    };

    validate_password(new, "New password must be at least 6 characters")?;

    auth_service::change_password(&state.users, auth.id, current, new).await?;

    Ok(Json(OkResponse { ok: true }))
}

/// Returns the signup link carrying the invite token, if one is configured.
pub async fn invite_link(State(state): State<AppState>) -> Json<InviteLinkResponse> {
    let link = state.config.invite_token.as_deref().map(|token| {
        let token: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
        format!(
            "{}/signup?token={}",
            state.config.app_url.trim_end_matches('/'),
            token
        )
    });

    Json(InviteLinkResponse { link })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_requires_configured_and_matching_token() {
        assert!(invite_accepted(Some("abc"), Some("abc")));
        assert!(!invite_accepted(Some("abd"), Some("abc")));
        assert!(!invite_accepted(Some("ab"), Some("abc")));
        assert!(!invite_accepted(None, Some("abc")));
        assert!(!invite_accepted(Some(""), Some("")));
        assert!(!invite_accepted(Some("abc"), None));
    }

    #[test]
    fn session_cookie_attributes() {
        let mut config = Config::development(crate::crypto::secret::SessionSecret::new("k"));
        let cookie = create_session_cookie("t".to_string(), &config);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), None);
        assert_eq!(cookie.same_site(), Some(tower_cookies::cookie::SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::days(30)));
        assert_eq!(cookie.path(), Some("/"));

        config.production = true;
        let cookie = create_session_cookie("t".to_string(), &config);
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn session_cookie_max_age_stays_in_range() {
        let mut config = Config::development(crate::crypto::secret::SessionSecret::new("k"));

        config.session_max_age_days = i64::MAX / 1000;
        let cookie = create_session_cookie("t".to_string(), &config);
        assert_eq!(cookie.max_age(), Some(Duration::days(MAX_SESSION_AGE_DAYS)));

        config.session_max_age_days = -5;
        let cookie = create_session_cookie("t".to_string(), &config);
        assert_eq!(cookie.max_age(), Some(Duration::days(1)));
    }
}
