use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    crypto::token::{SessionCodec, TokenError},
    error::AppError,
    models::user::AuthUser,
    state::AppState,
};

/// The cookie that carries the session token.
pub const SESSION_COOKIE_NAME: &str = "stir_auth";

/// Reads the raw session token from the request cookies.
pub fn extract_session_token(cookies: &Cookies) -> Option<String> {
    cookies
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

/// A middleware that requires a valid session for an existing account.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// The downstream `Response`, `401` for a missing or invalid session, or
/// `500` when the codec itself fails.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("🔐 Checking authentication...");

    let token = extract_session_token(&cookies);
    let subject = state.sessions.verify(token.as_deref())?;

    let user_id = Uuid::parse_str(&subject).map_err(|_| {
        tracing::warn!("❌ Session subject is not a user id");
        AppError::Token(TokenError::Invalid)
    })?;

    if state.users.find_by_id(&user_id).await?.is_none() {
        tracing::warn!("❌ Session for unknown user: {}", user_id);
        return Err(AppError::Unauthorized);
    }

    tracing::debug!("✅ User authenticated: {}", user_id);

    request.extensions_mut().insert(AuthUser { id: user_id });

    Ok(next.run(request).await)
}
