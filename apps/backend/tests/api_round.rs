//! Round progression API tests: translation, sentence, pronunciation, next.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use verb_core::RoundStage;

use common::fixtures;
use common::{StubAi, TestContext};

// === Translation ===

/// Test a correct translation scores and moves to the sentence prompt.
#[tokio::test]
async fn test_correct_translation() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/translation",
        &token,
        &fixtures::translation_request("  To Go "),
    )
    .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["correct"], true);
    assert_eq!(body["expected"], "to go");
    assert_eq!(body["stage"], RoundStage::AwaitingSentence.as_str());
    assert_eq!(body["scoreboard"]["correct_count"], 1);
    assert_eq!(body["scoreboard"]["total_count"], 1);
}

/// Test the leading "to " is optional.
#[tokio::test]
async fn test_translation_without_to() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/translation",
        &token,
        &fixtures::translation_request("go"),
    )
    .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["correct"], true);
}

/// Test a wrong translation counts as wrong but still moves on.
#[tokio::test]
async fn test_wrong_translation() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/translation",
        &token,
        &fixtures::translation_request("to walk"),
    )
    .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["correct"], false);
    assert_eq!(body["stage"], "awaiting_sentence");
    assert_eq!(body["scoreboard"]["wrong_count"], 1);
    assert_eq!(body["scoreboard"]["total_count"], 1);
}

/// Test an empty answer is rejected without touching the score.
#[tokio::test]
async fn test_empty_translation_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/translation",
        &token,
        &fixtures::translation_request("   "),
    )
    .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "input_empty");

    let status: serde_json::Value = TestContext::get(&server, "/api/session/status", &token)
        .await
        .json();
    assert_eq!(status["scoreboard"]["total_count"], 0);
    assert_eq!(status["round"]["stage"], "awaiting_translation");
}

/// Test a second translation in the same round is a conflict and not scored.
#[tokio::test]
async fn test_translation_twice_is_conflict() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/translation",
        &token,
        &fixtures::translation_request("to go"),
    )
    .await;

    response.assert_status(StatusCode::CONFLICT);
    let status: serde_json::Value = TestContext::get(&server, "/api/session/status", &token)
        .await
        .json();
    assert_eq!(status["scoreboard"]["total_count"], 1);
}

// === Sentence ===

/// Test sentence before translation is a conflict.
#[tokio::test]
async fn test_sentence_before_translation() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/sentence",
        &token,
        &fixtures::sentence_request("Ich gehe ins Kino"),
    )
    .await;

    response.assert_status(StatusCode::CONFLICT);
}

/// Test sentence grading without AI uses the basic matcher.
#[tokio::test]
async fn test_sentence_basic_grading() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/sentence",
        &token,
        &fixtures::sentence_request("Ich gehe nach Hause"),
    )
    .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["stage"], "complete");
    assert_eq!(body["usage"]["verb_present"], true);
    assert_eq!(body["usage"]["plausible_conjugation"], true);
    assert!(body.get("warning").is_none());
    assert_eq!(body["evaluation"]["source"], "basic");
    assert_eq!(body["evaluation"]["accuracy_percent"], 50);
    assert_eq!(body["evaluation"]["score"], "fair");
    assert_eq!(
        body["evaluation"]["words_correct"],
        serde_json::json!(["ich", "gehe"])
    );
    assert_eq!(
        body["evaluation"]["feedback_summary"],
        "You got 50% of the words right! Keep practicing!"
    );
    assert_eq!(body["evaluation"]["uses_target_verb_correctly"], true);
    assert!(body["evaluation"].get("is_grammatically_correct").is_none());
}

/// Test a sentence without the verb still completes, with a warning.
#[tokio::test]
async fn test_sentence_without_verb_warns() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/sentence",
        &token,
        &fixtures::sentence_request("Ich bin hier"),
    )
    .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["stage"], "complete");
    assert_eq!(body["usage"]["verb_present"], false);
    assert!(body["warning"].as_str().unwrap().contains("gehen"));
}

/// Test an empty sentence is rejected and the round stays put.
#[tokio::test]
async fn test_empty_sentence_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/sentence",
        &token,
        &fixtures::sentence_request(""),
    )
    .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let status: serde_json::Value = TestContext::get(&server, "/api/session/status", &token)
        .await
        .json();
    assert_eq!(status["round"]["stage"], "awaiting_sentence");
    assert!(status["pending"].is_null());
}

/// Test the AI grader's result is used when it answers.
#[tokio::test]
async fn test_sentence_ai_grading() {
    let ctx = TestContext::with_ai(StubAi {
        grade_reply: Some(fixtures::sentence_grade_reply()),
        ..Default::default()
    });
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/sentence",
        &token,
        &fixtures::sentence_request("Ich gehe heute ins Kino"),
    )
    .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["evaluation"]["source"], "ai");
    assert_eq!(body["evaluation"]["score"], "good");
    assert_eq!(body["evaluation"]["accuracy_percent"], 80);
    assert_eq!(body["evaluation"]["is_grammatically_correct"], true);
    assert_eq!(
        body["evaluation"]["corrected_sentence"],
        "Heute gehe ich ins Kino."
    );
}

/// Test a failing grader falls back to the basic matcher, never an error.
#[tokio::test]
async fn test_sentence_grader_failure_falls_back() {
    let ctx = TestContext::with_ai(StubAi::default());
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/sentence",
        &token,
        &fixtures::sentence_request("Ich gehe ins Kino"),
    )
    .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["evaluation"]["source"], "basic");
    assert_eq!(body["evaluation"]["accuracy_percent"], 100);
    assert_eq!(body["evaluation"]["score"], "excellent");
    assert_eq!(body["stage"], "complete");
}

/// Test a garbled grader reply falls back as well.
#[tokio::test]
async fn test_sentence_unparseable_reply_falls_back() {
    let ctx = TestContext::with_ai(StubAi {
        grade_reply: Some("Sounds great to me!".to_string()),
        ..Default::default()
    });
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/sentence",
        &token,
        &fixtures::sentence_request("Ich gehe ins Kino"),
    )
    .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["evaluation"]["source"], "basic");
}

/// Test a second sentence once the round is complete is a conflict.
#[tokio::test]
async fn test_sentence_after_complete_is_conflict() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::complete_round(&server, &token).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/sentence",
        &token,
        &fixtures::sentence_request("Ich gehe schon wieder"),
    )
    .await;

    response.assert_status(StatusCode::CONFLICT);
}

// === Next verb ===

/// Test advancing before the round is complete is a conflict.
#[tokio::test]
async fn test_next_before_complete() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = TestContext::post_json(
        &server,
        "/api/round/next",
        &token,
        &serde_json::json!({}),
    )
    .await;

    response.assert_status(StatusCode::CONFLICT);
}

/// Test advancing starts a fresh round and keeps the score board.
#[tokio::test]
async fn test_next_keeps_scoreboard() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::complete_round(&server, &token).await;

    let response = server
        .post("/api/round/next")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["round"]["number"], 2);
    assert_eq!(body["round"]["stage"], "awaiting_translation");
    assert_eq!(body["round"]["translation_submitted"], false);
    assert!(body["round"]["evaluation"].is_null());
    assert_eq!(body["scoreboard"]["correct_count"], 1);
    assert_eq!(body["scoreboard"]["total_count"], 1);
}

/// Test AI verbs come from the generator when enabled.
#[tokio::test]
async fn test_next_with_generated_verb() {
    let ctx = TestContext::with_ai(StubAi {
        verb: Some(fixtures::kaufen()),
        ..Default::default()
    });
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    server
        .put("/api/settings")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&serde_json::json!({ "ai_verbs": true }))
        .await
        .assert_status_ok();
    TestContext::complete_round(&server, &token).await;

    let response = server
        .post("/api/round/next")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["round"]["verb"]["german_verb"], "kaufen");
    assert_eq!(body["round"]["number"], 2);
}

/// Test a failing generator is a 502 and leaves the round untouched.
#[tokio::test]
async fn test_next_generator_failure() {
    let ctx = TestContext::with_ai(StubAi::default());
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    server
        .put("/api/settings")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&serde_json::json!({ "ai_verbs": true }))
        .await
        .assert_status_ok();
    TestContext::complete_round(&server, &token).await;

    let response = server
        .post("/api/round/next")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "external_service_error");

    let status: serde_json::Value = TestContext::get(&server, "/api/session/status", &token)
        .await
        .json();
    assert_eq!(status["round"]["number"], 1);
    assert_eq!(status["round"]["stage"], "complete");
    assert!(status["pending"].is_null());
}

/// Test a retry straight after a generator failure is not refused as in progress.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_next_retry_after_generator_failure() {
    let ctx = TestContext::with_ai(StubAi::default());
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    server
        .put("/api/settings")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&serde_json::json!({ "ai_verbs": true }))
        .await
        .assert_status_ok();
    TestContext::complete_round(&server, &token).await;

    for _ in 0..100 {
        let response = server
            .post("/api/round/next")
            .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);
    }
}

// === Pronunciation ===

/// Test pronunciation is refused before the translation is in.
#[tokio::test]
async fn test_pronunciation_before_translation() {
    let ctx = TestContext::with_ai(StubAi {
        transcript: Some("Ich gehe ins Kino".to_string()),
        ..Default::default()
    });
    let server = ctx.server();
    let token = TestContext::register(&server).await;

    let response = server
        .post("/api/round/pronunciation")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .multipart(fixtures::audio_form(b"RIFF....WAVE", "audio/wav"))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

/// Test a transcribed attempt is graded against the sample sentence.
#[tokio::test]
async fn test_pronunciation_attempt() {
    let ctx = TestContext::with_ai(StubAi {
        transcript: Some("Ich gehe ins Kino".to_string()),
        ..Default::default()
    });
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = server
        .post("/api/round/pronunciation")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .multipart(fixtures::audio_form(b"RIFF....WAVE", "audio/wav"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["target_sentence"], "Ich gehe ins Kino");
    assert_eq!(body["transcript"], "Ich gehe ins Kino");
    // Grader stub has no reply, so the basic matcher grades it
    assert_eq!(body["evaluation"]["source"], "basic");
    assert_eq!(body["evaluation"]["accuracy_percent"], 100);
    assert_eq!(body["stage"], "awaiting_sentence");

    let status: serde_json::Value = TestContext::get(&server, "/api/session/status", &token)
        .await
        .json();
    assert_eq!(status["round"]["pronunciation"]["transcript"], "Ich gehe ins Kino");
    assert_eq!(status["scoreboard"]["total_count"], 1);
}

/// Test the corrected sentence becomes the pronunciation target.
#[tokio::test]
async fn test_pronunciation_targets_corrected_sentence() {
    let ctx = TestContext::with_ai(StubAi {
        grade_reply: Some(fixtures::sentence_grade_reply()),
        transcript: Some("Heute gehe ich ins Kino".to_string()),
        ..Default::default()
    });
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::complete_round(&server, &token).await;

    let response = server
        .post("/api/round/pronunciation")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .multipart(fixtures::audio_form(b"OggS....", "audio/ogg"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["target_sentence"], "Heute gehe ich ins Kino.");
    assert_eq!(body["stage"], "complete");
}

/// Test a failed transcription is a 502 and stores nothing.
#[tokio::test]
async fn test_pronunciation_transcription_failure() {
    let ctx = TestContext::with_ai(StubAi::default());
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = server
        .post("/api/round/pronunciation")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .multipart(fixtures::audio_form(b"RIFF....WAVE", "audio/wav"))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);

    let status: serde_json::Value = TestContext::get(&server, "/api/session/status", &token)
        .await
        .json();
    assert!(status["round"]["pronunciation"].is_null());
}

/// Test a retry straight after a failed transcription reaches the transcriber again.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pronunciation_retry_after_failure() {
    let ctx = TestContext::with_ai(StubAi::default());
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    for _ in 0..50 {
        let response = server
            .post("/api/round/pronunciation")
            .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
            .multipart(fixtures::audio_form(b"RIFF....WAVE", "audio/wav"))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);
    }

    let status: serde_json::Value = TestContext::get(&server, "/api/session/status", &token)
        .await
        .json();
    assert!(status["pending"].is_null());
}

/// Test an empty transcript counts as unintelligible audio.
#[tokio::test]
async fn test_pronunciation_empty_transcript() {
    let ctx = TestContext::with_ai(StubAi {
        transcript: Some("  ".to_string()),
        ..Default::default()
    });
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = server
        .post("/api/round/pronunciation")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .multipart(fixtures::audio_form(b"RIFF....WAVE", "audio/wav"))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

/// Test pronunciation without a transcriber is a 502.
#[tokio::test]
async fn test_pronunciation_not_configured() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let response = server
        .post("/api/round/pronunciation")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .multipart(fixtures::audio_form(b"RIFF....WAVE", "audio/wav"))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("transcription is not configured"));
}

/// Test an empty recording and a non-audio upload are rejected.
#[tokio::test]
async fn test_pronunciation_rejects_bad_uploads() {
    let ctx = TestContext::with_ai(StubAi {
        transcript: Some("Ich gehe ins Kino".to_string()),
        ..Default::default()
    });
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    let empty = server
        .post("/api/round/pronunciation")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .multipart(fixtures::audio_form(b"", "audio/wav"))
        .await;
    empty.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = empty.json();
    assert_eq!(body["error"], "input_empty");

    let image = server
        .post("/api/round/pronunciation")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .multipart(fixtures::audio_form(b"\x89PNG", "image/png"))
        .await;
    image.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = image.json();
    assert_eq!(body["error"], "bad_request");
}

/// Test clearing the attempt allows a fresh try.
#[tokio::test]
async fn test_clear_pronunciation() {
    let ctx = TestContext::with_ai(StubAi {
        transcript: Some("Ich gehe ins Kino".to_string()),
        ..Default::default()
    });
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;
    server
        .post("/api/round/pronunciation")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .multipart(fixtures::audio_form(b"RIFF....WAVE", "audio/wav"))
        .await
        .assert_status_ok();

    let response = server
        .delete("/api/round/pronunciation")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;

    response.assert_status_ok();
    let status: serde_json::Value = TestContext::get(&server, "/api/session/status", &token)
        .await
        .json();
    assert!(status["round"]["pronunciation"].is_null());
    assert_eq!(status["round"]["stage"], "awaiting_sentence");
}

// === In-flight guard ===

/// Test a second guarded action while one is in flight is a conflict.
#[tokio::test]
async fn test_concurrent_evaluation_is_conflict() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = TestContext::register(&server).await;
    TestContext::pass_translation(&server, &token).await;

    // Hold the slot the way an in-flight sentence grading would
    let session_id = ctx.state.sessions.authenticate(&token).await.unwrap();
    let pending = ctx
        .state
        .sessions
        .with_session(session_id, |entry| entry.session.begin_sentence("Ich gehe"))
        .await
        .unwrap()
        .unwrap();

    let response = TestContext::post_json(
        &server,
        "/api/round/sentence",
        &token,
        &fixtures::sentence_request("Ich gehe ins Kino"),
    )
    .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "conflict");

    let status: serde_json::Value = TestContext::get(&server, "/api/session/status", &token)
        .await
        .json();
    assert_eq!(status["pending"], "sentence");

    ctx.state
        .sessions
        .with_session(session_id, |entry| entry.session.abandon(pending.ticket()))
        .await;
    TestContext::post_json(
        &server,
        "/api/round/sentence",
        &token,
        &fixtures::sentence_request("Ich gehe ins Kino"),
    )
    .await
    .assert_status_ok();
}
