pub mod admin;
pub mod analytics;
pub mod debug;
pub mod health;
pub mod user;

use crate::error::ApiError;
use crate::state::AppState;
use axum::http::HeaderMap;

/// Reads and verifies the session cookie, requiring the caller to be an
/// admin (spec §6: every `/api/admin/*` route is admin-gated).
pub fn require_admin(headers: &HeaderMap, state: &AppState) -> Result<crate::auth::SessionClaims, ApiError> {
    let cookie = headers.get(axum::http::header::COOKIE).and_then(|v| v.to_str().ok()).ok_or(ApiError::Unauthorized)?;
    let claims = crate::auth::decode_cookie(cookie, &state.config.session_secret).ok_or(ApiError::Unauthorized)?;
    if !state.is_admin(&claims.discord_id) {
        return Err(ApiError::Forbidden);
    }
    Ok(claims)
}
