//! Decoding of free-form grader responses.
//!
//! Graders are asked for JSON but often wrap it in prose or code fences. The
//! decoder takes the text between the first `{` and the last `}` and maps the
//! keys the grading prompts ask for onto [`EvaluationResult`].

use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::types::{EvaluationResult, EvaluationSource, ScoreBand, SentenceEvaluation};

/// Return the substring from the first `{` to the last `}`, inclusive.
pub fn extract_json_payload(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[derive(Debug, Deserialize)]
struct GraderPayload {
    #[serde(default, alias = "pronunciation_score")]
    score: Option<String>,
    #[serde(default, alias = "accuracy_percentage")]
    accuracy_percent: Option<Value>,
    #[serde(default)]
    words_correct: Vec<String>,
    #[serde(default)]
    words_incorrect: Vec<String>,
    #[serde(default, alias = "overall_feedback")]
    feedback_summary: Option<TextOrList>,
    #[serde(default, alias = "specific_feedback")]
    feedback_detail: Option<TextOrList>,
    #[serde(default)]
    suggestions: Option<TextOrList>,
    #[serde(default)]
    is_grammatically_correct: Option<bool>,
    #[serde(default)]
    uses_target_verb_correctly: Option<bool>,
    #[serde(default)]
    corrected_sentence: Option<String>,
}

/// Graders sometimes return a list of tips instead of a paragraph.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl TextOrList {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::List(items) => items.join("\n"),
        }
    }
}

fn text(field: Option<TextOrList>) -> String {
    field.map(TextOrList::into_text).unwrap_or_default()
}

/// Accepts 85, 85.4, "85" and "85%"; clamps to 0..=100.
fn accuracy_from_value(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

fn parse_payload(text: &str) -> Result<GraderPayload, DecodeError> {
    let json = extract_json_payload(text).ok_or(DecodeError::NoJsonPayload)?;
    serde_json::from_str(json).map_err(|e| DecodeError::InvalidJson(e.to_string()))
}

impl GraderPayload {
    fn into_parts(self) -> Result<(EvaluationResult, SentenceExtras), DecodeError> {
        let accuracy_percent = self
            .accuracy_percent
            .as_ref()
            .and_then(accuracy_from_value)
            .ok_or(DecodeError::MissingField("accuracy_percentage"))?;

        let score = self
            .score
            .as_deref()
            .and_then(ScoreBand::parse)
            .unwrap_or_else(|| ScoreBand::from_accuracy(accuracy_percent));

        let evaluation = EvaluationResult {
            score,
            accuracy_percent,
            words_correct: self.words_correct,
            words_incorrect: self.words_incorrect,
            feedback_summary: text(self.feedback_summary),
            feedback_detail: text(self.feedback_detail),
            suggestions: text(self.suggestions),
            source: EvaluationSource::Ai,
        };

        let extras = SentenceExtras {
            is_grammatically_correct: self.is_grammatically_correct,
            uses_target_verb_correctly: self.uses_target_verb_correctly,
            corrected_sentence: self
                .corrected_sentence
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };

        Ok((evaluation, extras))
    }
}

struct SentenceExtras {
    is_grammatically_correct: Option<bool>,
    uses_target_verb_correctly: Option<bool>,
    corrected_sentence: Option<String>,
}

/// Decode a pronunciation grading response.
pub fn decode_evaluation(text: &str) -> Result<EvaluationResult, DecodeError> {
    let (evaluation, _) = parse_payload(text)?.into_parts()?;
    Ok(evaluation)
}

/// Decode a sentence grading response, including the grammar judgement.
pub fn decode_sentence_evaluation(text: &str) -> Result<SentenceEvaluation, DecodeError> {
    let (evaluation, extras) = parse_payload(text)?.into_parts()?;
    Ok(SentenceEvaluation {
        evaluation,
        is_grammatically_correct: extras.is_grammatically_correct,
        uses_target_verb_correctly: extras.uses_target_verb_correctly,
        corrected_sentence: extras.corrected_sentence,
    })
}
