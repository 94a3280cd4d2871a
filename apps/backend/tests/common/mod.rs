//! Common test utilities for integration tests.
//!
//! Provides a [`TestContext`] that builds the real router around a fixed
//! one-verb lexicon and stub AI collaborators, so no network access is needed.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::Router;
use axum_test::TestServer;

use verb_trainer_backend::services::ai::{
    Collaborators, GradeRequest, Grader, ServiceError, SpeechSynthesizer, Transcriber,
    VerbGenerator,
};
use verb_trainer_backend::{router, AppState};
use verb_core::{DifficultyLevel, Lexicon, VerbEntry};

/// Stub for all four AI collaborators. `None` makes the call fail.
#[derive(Default)]
pub struct StubAi {
    pub grade_reply: Option<String>,
    pub transcript: Option<String>,
    pub verb: Option<VerbEntry>,
    pub audio: Option<Vec<u8>>,
    pub synthesized: Mutex<Vec<(String, String, f32)>>,
}

#[async_trait]
impl VerbGenerator for StubAi {
    async fn generate_verb(&self, _difficulty: DifficultyLevel) -> Result<VerbEntry, ServiceError> {
        self.verb
            .clone()
            .ok_or_else(|| ServiceError::Network("generator offline".to_string()))
    }
}

#[async_trait]
impl Transcriber for StubAi {
    async fn transcribe(&self, _audio: &[u8], _mime_type: &str) -> Result<String, ServiceError> {
        self.transcript
            .clone()
            .ok_or_else(|| ServiceError::Network("transcriber offline".to_string()))
    }
}

#[async_trait]
impl Grader for StubAi {
    async fn grade(&self, _request: &GradeRequest) -> Result<String, ServiceError> {
        self.grade_reply
            .clone()
            .ok_or_else(|| ServiceError::Network("grader offline".to_string()))
    }
}

#[async_trait]
impl SpeechSynthesizer for StubAi {
    async fn synthesize(&self, text: &str, voice: &str, speed: f32) -> Result<Vec<u8>, ServiceError> {
        self.synthesized
            .lock()
            .unwrap()
            .push((text.to_string(), voice.to_string(), speed));
        self.audio
            .clone()
            .ok_or_else(|| ServiceError::Network("synthesizer offline".to_string()))
    }
}

/// Test context wrapping the application router.
pub struct TestContext {
    pub state: AppState,
    pub ai: Option<Arc<StubAi>>,
    app: Router,
}

impl TestContext {
    /// Context with no AI collaborators; all grading uses the basic matcher.
    pub fn new() -> Self {
        Self::build(Collaborators::none(), None)
    }

    /// Context with every collaborator backed by `stub`.
    pub fn with_ai(stub: StubAi) -> Self {
        let stub = Arc::new(stub);
        Self::build(Collaborators::from_client(stub.clone()), Some(stub))
    }

    fn build(collaborators: Collaborators, ai: Option<Arc<StubAi>>) -> Self {
        let lexicon = Lexicon::new(vec![fixtures::gehen()]).expect("lexicon is not empty");
        let state = AppState::new(lexicon, collaborators, Duration::from_secs(2));
        let app = router(state.clone());
        Self { state, ai, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).unwrap()
    }

    /// Register a session through the API and return its token.
    pub async fn register(server: &TestServer) -> String {
        let response = server.post("/api/session/register").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["token"].as_str().unwrap().to_string()
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    pub async fn get(server: &TestServer, path: &str, token: &str) -> axum_test::TestResponse {
        server
            .get(path)
            .add_header(AUTHORIZATION, Self::auth_header_value(token))
            .await
    }

    pub async fn post_json(
        server: &TestServer,
        path: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> axum_test::TestResponse {
        server
            .post(path)
            .add_header(AUTHORIZATION, Self::auth_header_value(token))
            .json(body)
            .await
    }

    /// Submit the correct translation so the round moves to the sentence stage.
    pub async fn pass_translation(server: &TestServer, token: &str) {
        let response = Self::post_json(
            server,
            "/api/round/translation",
            token,
            &fixtures::translation_request("to go"),
        )
        .await;
        response.assert_status_ok();
    }

    /// Drive the round to Complete.
    pub async fn complete_round(server: &TestServer, token: &str) {
        Self::pass_translation(server, token).await;
        let response = Self::post_json(
            server,
            "/api/round/sentence",
            token,
            &fixtures::sentence_request("Ich gehe heute ins Kino"),
        )
        .await;
        response.assert_status_ok();
    }

}
