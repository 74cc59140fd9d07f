//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::state::AppState;

/// Middleware that validates the auth session cookie and extracts the user_id.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If invalid, expired, or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the session ID from the cookie header
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let auth_session_id = cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Validate the session in the database, get the user_id
    let user_id = state
        .db
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            debug!("Rejected auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    // 3. Make the user_id available to handlers
    req.extensions_mut().insert(user_id);

    Ok(next.run(req).await)
}
