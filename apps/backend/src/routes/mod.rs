pub mod auth;
pub mod round;
pub mod session;
pub mod settings;
pub mod speech;

use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::services::sessions::SessionEntry;
use crate::AppState;

/// Run `f` against the caller's session under the store lock.
pub(crate) async fn with_session<R>(
    state: &AppState,
    session_id: Uuid,
    f: impl FnOnce(&mut SessionEntry) -> R,
) -> Result<R> {
    state
        .sessions
        .with_session(session_id, f)
        .await
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}
