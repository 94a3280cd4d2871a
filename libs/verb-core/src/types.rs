//! Core types for the verb trainer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A verb to practise, with its canonical translation and an example sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbEntry {
    pub german_verb: String,
    pub english_translation: String,
    pub sample_sentence_german: String,
    pub sample_sentence_english: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl VerbEntry {
    pub fn new(
        german_verb: impl Into<String>,
        english_translation: impl Into<String>,
        sample_sentence_german: impl Into<String>,
        sample_sentence_english: impl Into<String>,
    ) -> Self {
        Self {
            german_verb: german_verb.into(),
            english_translation: english_translation.into(),
            sample_sentence_german: sample_sentence_german.into(),
            sample_sentence_english: sample_sentence_english.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Difficulty level requested from the verb generator and the grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        Self::Beginner
    }
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// Qualitative band for an accuracy percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl ScoreBand {
    /// Band for an accuracy percentage. Lower bounds are inclusive.
    pub fn from_accuracy(accuracy_percent: u8) -> Self {
        match accuracy_percent {
            90.. => Self::Excellent,
            75..=89 => Self::Good,
            50..=74 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::NeedsImprovement => "needs_improvement",
        }
    }

    /// Lenient parse: accepts "Needs Improvement", "needs-improvement", etc.
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match key.as_str() {
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "needs_improvement" | "poor" => Some(Self::NeedsImprovement),
            _ => None,
        }
    }
}

/// Which grading path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    Ai,
    Basic,
}

/// Normalized output of any grading path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: ScoreBand,
    pub accuracy_percent: u8,
    pub words_correct: Vec<String>,
    pub words_incorrect: Vec<String>,
    pub feedback_summary: String,
    pub feedback_detail: String,
    pub suggestions: String,
    pub source: EvaluationSource,
}

/// Result of grading a written sentence.
///
/// The grammar fields are `None` when the result came from the basic matcher,
/// which cannot judge them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceEvaluation {
    #[serde(flatten)]
    pub evaluation: EvaluationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_grammatically_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses_target_verb_correctly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_sentence: Option<String>,
}

impl SentenceEvaluation {
    /// Wrap a basic-matcher result, with no grammar judgement.
    pub fn basic(evaluation: EvaluationResult) -> Self {
        Self {
            evaluation,
            is_grammatically_correct: None,
            uses_target_verb_correctly: None,
            corrected_sentence: None,
        }
    }
}

/// Outcome of the verb-usage heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceUsage {
    pub verb_present: bool,
    pub plausible_conjugation: bool,
}

/// Cumulative translation-check counters for a session.
///
/// `total_count == correct_count + wrong_count` always holds; the only way to
/// change the counters is [`ScoreBoard::record`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBoard {
    correct_count: u32,
    wrong_count: u32,
    total_count: u32,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one translation check.
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.correct_count += 1;
        } else {
            self.wrong_count += 1;
        }
        self.total_count += 1;
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }
}

/// Stage of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStage {
    AwaitingTranslation,
    AwaitingSentence,
    Complete,
}

impl RoundStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingTranslation => "awaiting_translation",
            Self::AwaitingSentence => "awaiting_sentence",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for RoundStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A graded pronunciation attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PronunciationAttempt {
    pub target_sentence: String,
    pub transcript: String,
    pub evaluation: EvaluationResult,
}

/// One verb-practice cycle: translation prompt, then sentence prompt.
#[derive(Debug, Clone, Serialize)]
pub struct Round {
    pub number: u64,
    pub verb: VerbEntry,
    pub stage: RoundStage,
    pub user_translation: Option<String>,
    pub translation_correct: Option<bool>,
    pub translation_submitted: bool,
    pub user_sentence: Option<String>,
    pub usage: Option<SentenceUsage>,
    pub sentence_submitted: bool,
    pub evaluation: Option<SentenceEvaluation>,
    pub pronunciation: Option<PronunciationAttempt>,
    pub started_at: DateTime<Utc>,
}

impl Round {
    pub fn new(number: u64, verb: VerbEntry) -> Self {
        Self {
            number,
            verb,
            stage: RoundStage::AwaitingTranslation,
            user_translation: None,
            translation_correct: None,
            translation_submitted: false,
            user_sentence: None,
            usage: None,
            sentence_submitted: false,
            evaluation: None,
            pronunciation: None,
            started_at: Utc::now(),
        }
    }

    /// Sentence to practise saying: the corrected sentence when the grader
    /// supplied one, otherwise the verb's sample sentence.
    pub fn pronunciation_target(&self) -> &str {
        self.evaluation
            .as_ref()
            .and_then(|e| e.corrected_sentence.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.verb.sample_sentence_german)
    }
}

/// Voices accepted by the speech synthesizer.
pub const AVAILABLE_VOICES: [&str; 6] = ["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

/// Accepted speech speed range (inclusive).
pub const SPEECH_SPEED_RANGE: std::ops::RangeInclusive<f32> = 0.25..=4.0;

/// Per-session preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub difficulty: DifficultyLevel,
    pub ai_grading: bool,
    pub ai_verbs: bool,
    pub voice: String,
    pub speech_speed: f32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            difficulty: DifficultyLevel::default(),
            ai_grading: true,
            ai_verbs: false,
            voice: "alloy".to_string(),
            speech_speed: 1.0,
        }
    }
}
