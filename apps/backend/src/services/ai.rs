//! External AI collaborators.
//!
//! Each collaborator is optional. A session keeps working with all of them
//! absent: verbs come from the built-in lexicon and grading falls back to the
//! basic matcher. Generation, transcription and synthesis failures surface to
//! the caller; grading failures never do (see [`crate::services::evaluation`]).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use verb_core::{DifficultyLevel, VerbEntry};

/// Collaborator failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("could not understand the audio")]
    Unintelligible,
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Network(error.to_string())
        }
    }
}

/// What a grading request is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeKind {
    /// A written sentence that should use `verb`.
    Sentence { verb: String },
    /// A transcript of the learner reading the target sentence aloud.
    Pronunciation,
}

/// Input to the grader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRequest {
    pub kind: GradeKind,
    pub target_text: String,
    pub candidate_text: String,
    pub difficulty: DifficultyLevel,
}

/// Produces a fresh verb at a difficulty level.
#[async_trait]
pub trait VerbGenerator: Send + Sync {
    async fn generate_verb(&self, difficulty: DifficultyLevel) -> Result<VerbEntry, ServiceError>;
}

/// Speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio. An empty transcript is reported as
    /// [`ServiceError::Unintelligible`].
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, ServiceError>;
}

/// Grades a sentence or transcript. Returns the raw response text, which may
/// merely contain a JSON payload.
#[async_trait]
pub trait Grader: Send + Sync {
    async fn grade(&self, request: &GradeRequest) -> Result<String, ServiceError>;
}

/// Text-to-speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str, speed: f32) -> Result<Vec<u8>, ServiceError>;
}

/// The set of configured collaborators.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub generator: Option<Arc<dyn VerbGenerator>>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub grader: Option<Arc<dyn Grader>>,
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl Collaborators {
    /// No external services; everything runs locally.
    pub fn none() -> Self {
        Self::default()
    }

    /// Use one client for all four roles.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: VerbGenerator + Transcriber + Grader + SpeechSynthesizer + 'static,
    {
        Self {
            generator: Some(client.clone()),
            transcriber: Some(client.clone()),
            grader: Some(client.clone()),
            synthesizer: Some(client),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("generator", &self.generator.is_some())
            .field("transcriber", &self.transcriber.is_some())
            .field("grader", &self.grader.is_some())
            .field("synthesizer", &self.synthesizer.is_some())
            .finish()
    }
}
