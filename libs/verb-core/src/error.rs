//! Error types for verb-core.

use thiserror::Error;

use crate::types::RoundStage;

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised by session actions. None of them change session state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("nothing was entered")]
    InputEmpty,

    #[error("expected round stage {expected}, but the round is {actual}")]
    WrongStage {
        expected: RoundStage,
        actual: RoundStage,
    },

    #[error("the current round is not complete yet")]
    RoundIncomplete,

    #[error("another evaluation is still in progress")]
    EvaluationInProgress,

    #[error("submission no longer matches the current round")]
    StaleSubmission,

    #[error("submit a translation before practising pronunciation")]
    NothingToPronounce,
}

/// Errors from decoding a grader's free-form response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no JSON object found in response")]
    NoJsonPayload,

    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Errors building a lexicon.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexiconError {
    #[error("lexicon has no entries")]
    Empty,
}
