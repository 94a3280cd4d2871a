//! Authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::AppState;

/// Authenticated session info stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedSession {
    pub session_id: Uuid,
}

/// Auth middleware - extracts session token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    // Skip auth for register endpoint and health check
    let path = request.uri().path();
    if path == "/api/session/register" || path == "/health" {
        return Ok(next.run(request).await);
    }

    // Extract Bearer token
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?
        .to_string();

    // Look up session by token; this also updates last_seen
    let session_id = state
        .sessions
        .authenticate(&token)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))?;

    request
        .extensions_mut()
        .insert(AuthenticatedSession { session_id });

    Ok(next.run(request).await)
}
