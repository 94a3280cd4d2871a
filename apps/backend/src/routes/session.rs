//! Session registration and status endpoints

use axum::{extract::State, Extension, Json};
use verb_core::Session;

use crate::error::Result;
use crate::models::{SessionRegisterResponse, SessionStatusResponse};
use crate::routes::auth::AuthenticatedSession;
use crate::routes::with_session;
use crate::AppState;

/// POST /api/session/register
/// Creates a new session on a verb from the built-in lexicon and returns the token
pub async fn register(State(state): State<AppState>) -> Result<Json<SessionRegisterResponse>> {
    let session = Session::new(state.lexicon.pick());
    let (session_id, token) = state.sessions.create(session).await;

    tracing::info!("Registered new session: {}", session_id);

    Ok(Json(SessionRegisterResponse { session_id, token }))
}

/// GET /api/session/status
/// Returns the current round, score board and settings
pub async fn status(
    Extension(auth): Extension<AuthenticatedSession>,
    State(state): State<AppState>,
) -> Result<Json<SessionStatusResponse>> {
    let response = with_session(&state, auth.session_id, |entry| SessionStatusResponse {
        session_id: entry.id,
        round: entry.session.round().clone(),
        scoreboard: *entry.session.scoreboard(),
        settings: entry.session.settings().clone(),
        pending: entry.session.pending(),
        created_at: entry.created_at,
        last_seen_at: entry.last_seen_at,
    })
    .await?;

    Ok(Json(response))
}
