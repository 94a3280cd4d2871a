//! Settings endpoints

use axum::{extract::State, Extension, Json};
use verb_core::{AVAILABLE_VOICES, SPEECH_SPEED_RANGE};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedSession;
use crate::routes::with_session;
use crate::AppState;

/// GET /api/settings
pub async fn get(
    Extension(auth): Extension<AuthenticatedSession>,
    State(state): State<AppState>,
) -> Result<Json<SessionSettings>> {
    let settings =
        with_session(&state, auth.session_id, |entry| entry.session.settings().clone()).await?;

    Ok(Json(settings))
}

/// PUT /api/settings
/// Partial update; the score board and current round are left alone
pub async fn update(
    Extension(auth): Extension<AuthenticatedSession>,
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SessionSettings>> {
    validate(&request)?;

    let settings = with_session(&state, auth.session_id, |entry| {
        let current = entry.session.settings_mut();

        // Apply updates
        if let Some(difficulty) = request.difficulty {
            current.difficulty = difficulty;
        }
        if let Some(ai_grading) = request.ai_grading {
            current.ai_grading = ai_grading;
        }
        if let Some(ai_verbs) = request.ai_verbs {
            current.ai_verbs = ai_verbs;
        }
        if let Some(voice) = request.voice {
            current.voice = voice;
        }
        if let Some(speech_speed) = request.speech_speed {
            current.speech_speed = speech_speed;
        }

        current.clone()
    })
    .await?;

    tracing::debug!("Updated settings for session {}", auth.session_id);

    Ok(Json(settings))
}

fn validate(request: &UpdateSettingsRequest) -> Result<()> {
    if let Some(voice) = &request.voice {
        if !AVAILABLE_VOICES.contains(&voice.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Unknown voice '{voice}', expected one of: {}",
                AVAILABLE_VOICES.join(", ")
            )));
        }
    }
    if let Some(speed) = request.speech_speed {
        if !SPEECH_SPEED_RANGE.contains(&speed) {
            return Err(ApiError::BadRequest(format!(
                "Speech speed {speed} is outside {}..={}",
                SPEECH_SPEED_RANGE.start(),
                SPEECH_SPEED_RANGE.end()
            )));
        }
    }
    Ok(())
}
