//! Text-to-speech endpoint

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::SpeechRequest;
use crate::routes::auth::AuthenticatedSession;
use crate::routes::with_session;
use crate::services::ai::ServiceError;
use crate::services::with_timeout;
use crate::AppState;

/// POST /api/speech
/// Speaks `text`, or the round's pronunciation target when none is given
pub async fn synthesize(
    Extension(auth): Extension<AuthenticatedSession>,
    State(state): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> Result<Response> {
    let synthesizer = state
        .ai
        .synthesizer
        .clone()
        .ok_or(ServiceError::NotConfigured("speech synthesis"))?;

    let (text, voice, speed) = with_session(&state, auth.session_id, |entry| {
        let text = request
            .text
            .unwrap_or_else(|| entry.session.round().pronunciation_target().to_string());
        let settings = entry.session.settings();
        (text, settings.voice.clone(), settings.speech_speed)
    })
    .await?;

    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::InputEmpty("nothing to speak".to_string()));
    }

    let audio = with_timeout(state.ai_timeout, synthesizer.synthesize(text, &voice, speed)).await?;

    Ok(([(CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}
