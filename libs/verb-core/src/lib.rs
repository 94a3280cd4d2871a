//! Core verb-practice library shared by the backend.
//!
//! Provides:
//! - Built-in German verb lexicon
//! - Answer matching (translation check, verb-usage heuristic, word-overlap scorer)
//! - Tolerant decoding of AI grader responses
//! - Session tracking and round progression
//! - Shared types (VerbEntry, Round, ScoreBoard, EvaluationResult, etc.)

pub mod error;
pub mod evaluation;
pub mod lexicon;
pub mod matching;
pub mod session;
pub mod types;

pub use error::{DecodeError, LexiconError, Result, SessionError};
pub use evaluation::{decode_evaluation, decode_sentence_evaluation, extract_json_payload};
pub use lexicon::Lexicon;
pub use matching::{check_sentence_usage, check_translation, conjugation_candidates, score_basic};
pub use session::{
    PendingAction, PendingAdvance, PendingPronunciation, PendingSentence, Session, Ticket,
    TranslationOutcome,
};
pub use types::{
    DifficultyLevel, EvaluationResult, EvaluationSource, PronunciationAttempt, Round, RoundStage,
    ScoreBand, ScoreBoard, SentenceEvaluation, SentenceUsage, SessionSettings, VerbEntry,
    AVAILABLE_VOICES, SPEECH_SPEED_RANGE,
};
