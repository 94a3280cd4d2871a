//! Evaluation orchestration.
//!
//! Decides per submission whether to ask the grader or use the basic matcher,
//! and always returns a displayable result. Grader errors, timeouts and
//! undecodable responses all degrade to [`verb_core::score_basic`].

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use verb_core::{
    decode_evaluation, decode_sentence_evaluation, score_basic, DecodeError, EvaluationResult,
    PendingPronunciation, PendingSentence, SentenceEvaluation,
};

use crate::services::ai::{GradeKind, GradeRequest, Grader, ServiceError};
use crate::services::with_timeout;

/// Why a grading call did not produce a usable result.
#[derive(Debug, thiserror::Error)]
enum GradingFailure {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Grades sentences and pronunciation attempts.
#[derive(Clone)]
pub struct Evaluator {
    grader: Option<Arc<dyn Grader>>,
    timeout: Duration,
}

impl Evaluator {
    pub fn new(grader: Option<Arc<dyn Grader>>, timeout: Duration) -> Self {
        Self { grader, timeout }
    }

    /// Grade a written sentence against the verb's sample sentence.
    pub async fn evaluate_sentence(&self, pending: &PendingSentence) -> SentenceEvaluation {
        let target = &pending.verb.sample_sentence_german;

        if let Some(grader) = self.grader_for(pending.ai_grading) {
            let request = GradeRequest {
                kind: GradeKind::Sentence {
                    verb: pending.verb.german_verb.clone(),
                },
                target_text: target.clone(),
                candidate_text: pending.sentence.clone(),
                difficulty: pending.difficulty,
            };
            match self.call(grader, &request).await {
                Ok(text) => match decode_sentence_evaluation(&text) {
                    Ok(evaluation) => return evaluation,
                    Err(e) => log_fallback("sentence", &GradingFailure::from(e)),
                },
                Err(e) => log_fallback("sentence", &GradingFailure::from(e)),
            }
        }

        let mut evaluation = SentenceEvaluation::basic(score_basic(target, &pending.sentence));
        evaluation.uses_target_verb_correctly =
            Some(pending.usage.verb_present && pending.usage.plausible_conjugation);
        evaluation
    }

    /// Grade a transcript against the pronunciation target.
    pub async fn evaluate_pronunciation(
        &self,
        pending: &PendingPronunciation,
        transcript: &str,
    ) -> EvaluationResult {
        if let Some(grader) = self.grader_for(pending.ai_grading) {
            let request = GradeRequest {
                kind: GradeKind::Pronunciation,
                target_text: pending.target_sentence.clone(),
                candidate_text: transcript.to_string(),
                difficulty: pending.difficulty,
            };
            match self.call(grader, &request).await {
                Ok(text) => match decode_evaluation(&text) {
                    Ok(evaluation) => return evaluation,
                    Err(e) => log_fallback("pronunciation", &GradingFailure::from(e)),
                },
                Err(e) => log_fallback("pronunciation", &GradingFailure::from(e)),
            }
        }

        score_basic(&pending.target_sentence, transcript)
    }

    fn grader_for(&self, ai_grading: bool) -> Option<&Arc<dyn Grader>> {
        self.grader.as_ref().filter(|_| ai_grading)
    }

    async fn call(&self, grader: &Arc<dyn Grader>, request: &GradeRequest) -> Result<String, ServiceError> {
        with_timeout(self.timeout, grader.grade(request)).await
    }
}

fn log_fallback(what: &str, failure: &GradingFailure) {
    warn!(error = %failure, "{what} grading failed, using basic matcher");
}
