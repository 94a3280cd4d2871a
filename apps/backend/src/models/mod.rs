//! API request and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export shared types from verb-core
pub use verb_core::types::{
    DifficultyLevel, EvaluationResult, PronunciationAttempt, Round, RoundStage, ScoreBoard,
    SentenceEvaluation, SentenceUsage, SessionSettings, VerbEntry,
};
pub use verb_core::{PendingAction, TranslationOutcome};

// === Session Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionRegisterResponse {
    pub session_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: Uuid,
    pub round: Round,
    pub scoreboard: ScoreBoard,
    pub settings: SessionSettings,
    pub pending: Option<PendingAction>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

// === Round Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTranslationRequest {
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitSentenceRequest {
    #[serde(default)]
    pub sentence: String,
}

#[derive(Debug, Serialize)]
pub struct SentenceResponse {
    pub usage: SentenceUsage,
    /// Soft warning from the verb-usage heuristic; never blocks progression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub evaluation: SentenceEvaluation,
    pub stage: RoundStage,
}

#[derive(Debug, Serialize)]
pub struct PronunciationResponse {
    pub target_sentence: String,
    pub transcript: String,
    pub evaluation: EvaluationResult,
    pub stage: RoundStage,
}

#[derive(Debug, Serialize)]
pub struct NextVerbResponse {
    pub round: Round,
    pub scoreboard: ScoreBoard,
}

// === Settings Types ===

/// Partial settings update; absent fields keep their value.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub difficulty: Option<DifficultyLevel>,
    pub ai_grading: Option<bool>,
    pub ai_verbs: Option<bool>,
    pub voice: Option<String>,
    pub speech_speed: Option<f32>,
}

// === Speech Types ===

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Text to speak; defaults to the round's pronunciation target.
    pub text: Option<String>,
}
