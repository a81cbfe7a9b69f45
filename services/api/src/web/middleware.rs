//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::auth::session_id_from_headers;
use crate::web::state::AppState;

/// Middleware that validates the auth session cookie and extracts the
/// user id.
///
/// If valid, inserts the user id into request extensions for handlers to
/// use. If invalid, missing, or expired, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = session_id_from_headers(req.headers())
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    let user_id = state
        .users
        .validate_auth_session(&session_id)
        .await
        .map_err(|e| {
            debug!("Rejected session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}
