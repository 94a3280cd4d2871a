//! OpenAI-compatible client implementing every collaborator role.
//!
//! Talks to `{base_url}/chat/completions`, `{base_url}/audio/transcriptions`
//! and `{base_url}/audio/speech`, so any provider that mirrors those endpoints
//! works by changing `OPENAI_BASE_URL`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use verb_core::{extract_json_payload, DifficultyLevel, VerbEntry};

use crate::config::AiConfig;
use crate::services::ai::{
    GradeKind, GradeRequest, Grader, ServiceError, SpeechSynthesizer, Transcriber, VerbGenerator,
};

const GRADING_TEMPERATURE: f32 = 0.3;
const GENERATION_TEMPERATURE: f32 = 0.9;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'a str,
}

/// Client for an OpenAI-compatible API.
pub struct OpenAiClient {
    config: AiConfig,
    http: Client,
}

impl OpenAiClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(config: AiConfig, timeout: Duration) -> Result<Self, ServiceError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    async fn chat(&self, prompt: &str, temperature: f32) -> Result<String, ServiceError> {
        debug!(model = %self.config.chat_model, "sending chat completion request");

        let request = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        let resp = self
            .http
            .post(self.url("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Parse("completion has no content".to_string()))
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    Err(ServiceError::Upstream { status, message })
}

/// Map a MIME type to a file extension for the multipart upload.
fn mime_to_extension(mime_type: &str) -> &'static str {
    let base = mime_type.split(';').next().unwrap_or_default().trim();
    match base {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/ogg" => "ogg",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/aac" => "aac",
        "audio/3gpp" => "3gp",
        "audio/webm" | "video/webm" => "webm",
        _ => "wav",
    }
}

fn generation_prompt(difficulty: DifficultyLevel) -> String {
    format!(
        "Pick one German verb suitable for a {level} learner.\n\
         Respond with a JSON object only, with these keys:\n\
         - german_verb: the infinitive\n\
         - english_translation: the English infinitive, starting with \"to \"\n\
         - sample_sentence_german: a short natural German sentence using the verb\n\
         - sample_sentence_english: its English translation\n\
         - category: one of \"regular\", \"irregular\", \"modal\", \"separable\", \"reflexive\"",
        level = difficulty.as_str()
    )
}

fn grading_prompt(request: &GradeRequest) -> String {
    match &request.kind {
        GradeKind::Sentence { verb } => format!(
            "A {level} German learner was asked to write a sentence using the verb \"{verb}\".\n\
             Example sentence: \"{target}\"\n\
             Learner's sentence: \"{candidate}\"\n\n\
             Respond with a JSON object only, with these keys:\n\
             - score: \"excellent\", \"good\", \"fair\" or \"needs_improvement\"\n\
             - accuracy_percentage: number from 0 to 100\n\
             - is_grammatically_correct: boolean\n\
             - uses_target_verb_correctly: boolean\n\
             - corrected_sentence: the learner's sentence with mistakes fixed\n\
             - words_correct: list of words used correctly\n\
             - words_incorrect: list of words with mistakes\n\
             - overall_feedback: one encouraging sentence\n\
             - specific_feedback: what was right and wrong\n\
             - suggestions: concrete tips for improvement",
            level = request.difficulty.as_str(),
            verb = verb,
            target = request.target_text,
            candidate = request.candidate_text,
        ),
        GradeKind::Pronunciation => format!(
            "Analyze this German pronunciation attempt by a {level} learner.\n\
             Target sentence: \"{target}\"\n\
             Transcript of what the learner said: \"{candidate}\"\n\n\
             Respond with a JSON object only, with these keys:\n\
             - pronunciation_score: \"excellent\", \"good\", \"fair\" or \"needs_improvement\"\n\
             - accuracy_percentage: number from 0 to 100\n\
             - words_correct: list of words pronounced correctly\n\
             - words_incorrect: list of words that need practice\n\
             - overall_feedback: one encouraging sentence\n\
             - specific_feedback: detailed analysis\n\
             - suggestions: concrete tips for improvement",
            level = request.difficulty.as_str(),
            target = request.target_text,
            candidate = request.candidate_text,
        ),
    }
}

/// Parse a generated verb out of a free-form completion.
fn parse_generated_verb(text: &str) -> Result<VerbEntry, ServiceError> {
    let json = extract_json_payload(text)
        .ok_or_else(|| ServiceError::Parse("no JSON object in verb response".to_string()))?;
    let verb: VerbEntry =
        serde_json::from_str(json).map_err(|e| ServiceError::Parse(e.to_string()))?;

    let required = [
        &verb.german_verb,
        &verb.english_translation,
        &verb.sample_sentence_german,
        &verb.sample_sentence_english,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(ServiceError::Parse("generated verb has empty fields".to_string()));
    }
    Ok(verb)
}

#[async_trait]
impl VerbGenerator for OpenAiClient {
    async fn generate_verb(&self, difficulty: DifficultyLevel) -> Result<VerbEntry, ServiceError> {
        let text = self
            .chat(&generation_prompt(difficulty), GENERATION_TEMPERATURE)
            .await?;
        parse_generated_verb(&text)
    }
}

#[async_trait]
impl Grader for OpenAiClient {
    async fn grade(&self, request: &GradeRequest) -> Result<String, ServiceError> {
        self.chat(&grading_prompt(request), GRADING_TEMPERATURE).await
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, ServiceError> {
        debug!(
            model = %self.config.transcription_model,
            bytes = audio.len(),
            mime_type,
            "sending transcription request"
        );

        let file_part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(format!("audio.{}", mime_to_extension(mime_type)))
            .mime_str(mime_type)
            .map_err(|e| ServiceError::Parse(format!("MIME error: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.transcription_model.clone())
            .text("language", "de")
            .text("response_format", "json");

        let resp = self
            .http
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let body: TranscriptionResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        let text = body.text.trim();
        if text.is_empty() {
            return Err(ServiceError::Unintelligible);
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiClient {
    async fn synthesize(&self, text: &str, voice: &str, speed: f32) -> Result<Vec<u8>, ServiceError> {
        debug!(model = %self.config.speech_model, voice, speed, "sending speech request");

        let request = SpeechRequest {
            model: &self.config.speech_model,
            input: text,
            voice,
            speed,
            response_format: "mp3",
        };

        let resp = self
            .http
            .post(self.url("audio/speech"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        Ok(resp.bytes().await?.to_vec())
    }
}
