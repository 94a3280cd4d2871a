//! Round endpoints: translation, sentence, pronunciation and next verb

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Extension, Json,
};
use verb_core::{SentenceUsage, SessionError};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedSession;
use crate::routes::with_session;
use crate::services::ai::ServiceError;
use crate::services::sessions::SlotGuard;
use crate::services::with_timeout;
use crate::AppState;

/// POST /api/round/translation
pub async fn translation(
    Extension(auth): Extension<AuthenticatedSession>,
    State(state): State<AppState>,
    Json(payload): Json<SubmitTranslationRequest>,
) -> Result<Json<TranslationOutcome>> {
    let outcome = with_session(&state, auth.session_id, |entry| {
        entry.session.submit_translation(&payload.answer)
    })
    .await??;

    Ok(Json(outcome))
}

/// POST /api/round/sentence
/// Checks verb usage, then grades the sentence with the AI grader or the basic matcher
pub async fn sentence(
    Extension(auth): Extension<AuthenticatedSession>,
    State(state): State<AppState>,
    Json(payload): Json<SubmitSentenceRequest>,
) -> Result<Json<SentenceResponse>> {
    let pending = with_session(&state, auth.session_id, |entry| {
        entry.session.begin_sentence(&payload.sentence)
    })
    .await??;
    let guard = SlotGuard::new(state.sessions.clone(), auth.session_id, pending.ticket());

    let usage = pending.usage;
    let warning = usage_warning(&usage, &pending.verb.german_verb);
    let evaluation = state.evaluator.evaluate_sentence(&pending).await;

    let response = with_session(&state, auth.session_id, |entry| {
        let stage = entry.session.complete_sentence(pending, evaluation.clone())?.stage;
        Ok::<_, SessionError>(SentenceResponse {
            usage,
            warning,
            evaluation,
            stage,
        })
    })
    .await??;
    guard.disarm();

    Ok(Json(response))
}

/// POST /api/round/pronunciation
/// Multipart upload with an `audio` field; transcribes it and grades the transcript
pub async fn pronunciation(
    Extension(auth): Extension<AuthenticatedSession>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PronunciationResponse>> {
    let (audio, mime_type) = read_audio(multipart).await?;
    let transcriber = state
        .ai
        .transcriber
        .clone()
        .ok_or(ServiceError::NotConfigured("transcription"))?;

    let pending = with_session(&state, auth.session_id, |entry| {
        entry.session.begin_pronunciation()
    })
    .await??;
    let guard = SlotGuard::new(state.sessions.clone(), auth.session_id, pending.ticket());

    let transcript =
        match with_timeout(state.ai_timeout, transcriber.transcribe(&audio, &mime_type)).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                guard.release().await;
                return Err(ServiceError::Unintelligible.into());
            }
            Err(e) => {
                guard.release().await;
                return Err(e.into());
            }
        };

    let evaluation = state
        .evaluator
        .evaluate_pronunciation(&pending, &transcript)
        .await;

    let response = with_session(&state, auth.session_id, |entry| {
        let attempt = entry
            .session
            .complete_pronunciation(pending, transcript, evaluation)?
            .clone();
        Ok::<_, SessionError>(PronunciationResponse {
            target_sentence: attempt.target_sentence,
            transcript: attempt.transcript,
            evaluation: attempt.evaluation,
            stage: entry.session.stage(),
        })
    })
    .await??;
    guard.disarm();

    Ok(Json(response))
}

/// DELETE /api/round/pronunciation
pub async fn clear_pronunciation(
    Extension(auth): Extension<AuthenticatedSession>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>> {
    with_session(&state, auth.session_id, |entry| {
        entry.session.clear_pronunciation()
    })
    .await??;

    Ok(Json(serde_json::json!({ "cleared": true })))
}

/// POST /api/round/next
/// Starts a fresh round once the current one is complete
pub async fn next(
    Extension(auth): Extension<AuthenticatedSession>,
    State(state): State<AppState>,
) -> Result<Json<NextVerbResponse>> {
    let ai_verbs = with_session(&state, auth.session_id, |entry| {
        entry.session.settings().ai_verbs
    })
    .await?;

    let Some(generator) = state.ai.generator.clone().filter(|_| ai_verbs) else {
        let verb = state.lexicon.pick();
        let response = with_session(&state, auth.session_id, |entry| {
            let round = entry.session.next_verb(verb)?.clone();
            Ok::<_, SessionError>(NextVerbResponse {
                round,
                scoreboard: *entry.session.scoreboard(),
            })
        })
        .await??;
        return Ok(Json(response));
    };

    let pending = with_session(&state, auth.session_id, |entry| entry.session.begin_advance())
        .await??;
    let guard = SlotGuard::new(state.sessions.clone(), auth.session_id, pending.ticket());

    let verb = match with_timeout(state.ai_timeout, generator.generate_verb(pending.difficulty)).await
    {
        Ok(verb) => verb,
        Err(e) => {
            guard.release().await;
            return Err(e.into());
        }
    };
    tracing::info!("Generated verb '{}' for session {}", verb.german_verb, auth.session_id);

    let response = with_session(&state, auth.session_id, |entry| {
        let round = entry.session.complete_advance(pending, verb)?.clone();
        Ok::<_, SessionError>(NextVerbResponse {
            round,
            scoreboard: *entry.session.scoreboard(),
        })
    })
    .await??;
    guard.disarm();

    Ok(Json(response))
}

/// Soft hint from the usage heuristic. Never blocks the round.
fn usage_warning(usage: &SentenceUsage, verb: &str) -> Option<String> {
    if !usage.verb_present {
        Some(format!("The sentence does not seem to use '{verb}'"))
    } else if !usage.plausible_conjugation {
        Some(format!("'{verb}' is present, but the conjugation looks off"))
    } else {
        None
    }
}

/// Pull the `audio` field out of a multipart upload.
async fn read_audio(mut multipart: Multipart) -> Result<(Bytes, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("audio") {
            continue;
        }

        let mime_type = field.content_type().unwrap_or("audio/wav").to_string();
        if !is_supported_audio(&mime_type) {
            return Err(ApiError::BadRequest(format!(
                "Unsupported audio type: {mime_type}"
            )));
        }

        let audio = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        if audio.is_empty() {
            return Err(ApiError::InputEmpty("audio recording is empty".to_string()));
        }
        return Ok((audio, mime_type));
    }

    Err(ApiError::BadRequest("Missing 'audio' field".to_string()))
}

fn is_supported_audio(mime_type: &str) -> bool {
    let base = mime_type.split(';').next().unwrap_or_default().trim();
    base.starts_with("audio/") || base == "video/webm" || base == "video/3gpp"
}
