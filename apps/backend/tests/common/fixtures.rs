//! Test fixtures and factory functions for request bodies.

use axum_test::multipart::{MultipartForm, Part};
use serde_json::json;
use verb_core::VerbEntry;

/// The only verb in the test lexicon.
pub fn gehen() -> VerbEntry {
    VerbEntry::new("gehen", "to go", "Ich gehe ins Kino", "I go to the cinema")
}

pub fn kaufen() -> VerbEntry {
    VerbEntry::new(
        "kaufen",
        "to buy",
        "Ich kaufe Brot",
        "I buy bread",
    )
}

pub fn translation_request(answer: &str) -> serde_json::Value {
    json!({ "answer": answer })
}

pub fn sentence_request(sentence: &str) -> serde_json::Value {
    json!({ "sentence": sentence })
}

/// Grader reply in the shape the sentence prompt asks for.
pub fn sentence_grade_reply() -> String {
    r#"Here is the evaluation:
{
  "score": "good",
  "accuracy_percentage": 80,
  "words_correct": ["ich", "gehe", "ins", "kino"],
  "words_incorrect": ["heute"],
  "overall_feedback": "Nice sentence.",
  "specific_feedback": "Word order is fine.",
  "suggestions": "Try a time expression at the start.",
  "is_grammatically_correct": true,
  "uses_target_verb_correctly": true,
  "corrected_sentence": "Heute gehe ich ins Kino."
}"#
    .to_string()
}

/// Multipart body with a single `audio` part.
pub fn audio_form(bytes: &[u8], mime_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "audio",
        Part::bytes(bytes.to_vec())
            .file_name("recording.wav")
            .mime_type(mime_type),
    )
}
