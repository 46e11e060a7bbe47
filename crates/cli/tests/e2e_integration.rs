//! End-to-end integration tests for docchat.
//!
//! These drive whole conversations through `ChatService` with a scripted
//! provider, from user input to transcript, cost and export.

use std::sync::Arc;

use docchat_agent::{ChatService, export_to_path, import_messages};
use docchat_core::document::{Document, PlainTextExtractor};
use docchat_core::error::ApiError;
use docchat_core::message::{Message, Role};
use docchat_core::prompt::DOCUMENT_PREFIX;
use docchat_core::session::ConversationSession;
use docchat_providers::{ScriptedProvider, text_response};
use docchat_telemetry::CostEstimator;

const SYSTEM_PROMPT: &str = "You are an AI assistant that writes concise reports.";

fn chat(provider: Arc<ScriptedProvider>) -> ChatService {
    ChatService::new(provider, "gpt-35-turbo", CostEstimator::default())
}

// ── Turn bookkeeping ─────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_n_turns_keep_sequences_aligned() {
    let replies = ["one", "two", "three", "four", "five"];
    let provider = Arc::new(ScriptedProvider::texts(&replies, 120));
    let chat = chat(provider.clone());
    let mut session = ConversationSession::new(SYSTEM_PROMPT);

    for (i, _) in replies.iter().enumerate() {
        chat.submit(&mut session, &format!("question {i}"), None)
            .await
            .unwrap();

        let n = i + 1;
        assert_eq!(session.past_inputs().len(), n);
        assert_eq!(session.generated_outputs().len(), n);
        assert_eq!(session.model_names().len(), n);
        assert_eq!(session.token_counts().len(), n);
        assert_eq!(session.turn_costs().len(), n);
        assert_eq!(session.messages().len(), 2 * n + 1);
    }

    assert_eq!(session.generated_outputs(), replies.to_vec());
    assert_eq!(session.messages()[0], Message::system(SYSTEM_PROMPT));

    // Each request carries the whole history so far plus the new message.
    let requests = provider.requests();
    for (i, request) in requests.iter().enumerate() {
        assert_eq!(request.messages.len(), 2 * i + 2);
        assert_eq!(request.messages.last().unwrap().role, Role::User);
    }
}

#[tokio::test]
async fn e2e_cost_is_sum_of_turn_estimates() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(text_response("a", 38)),
        Ok(text_response("b", 1234)),
        Ok(text_response("c", 7)),
        Ok(text_response("d", 999)),
    ]));
    let estimator = CostEstimator::new(0.0015).unwrap();
    let chat = ChatService::new(provider, "gpt-35-turbo", estimator);
    let mut session = ConversationSession::new(SYSTEM_PROMPT);

    let mut previous = 0.0;
    for q in ["q1", "q2", "q3", "q4"] {
        chat.submit(&mut session, q, None).await.unwrap();
        assert!(session.total_cost() >= previous);
        previous = session.total_cost();
    }

    let expected: f64 = session
        .token_counts()
        .iter()
        .map(|t| estimator.estimate(*t))
        .sum();
    assert!((session.total_cost() - expected).abs() < 1e-12);
    assert_eq!(session.turn_costs().iter().sum::<f64>(), session.total_cost());
}

// ── Document merge ───────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_document_scenario_merges_only_first_turn() {
    let provider = Arc::new(ScriptedProvider::texts(&["Revenue rose.", "No."], 50));
    let chat = chat(provider.clone());
    let mut session = ConversationSession::new(SYSTEM_PROMPT);
    let doc = Document::new("report.pdf", "Revenue grew 10%.");

    chat.submit(&mut session, "Summarize.", Some(&doc)).await.unwrap();
    chat.submit(&mut session, "Anything else?", Some(&doc)).await.unwrap();

    let requests = provider.requests();
    assert_eq!(
        requests[0].messages.last().unwrap().content,
        "Here is the information from PDF file: Revenue grew 10%.\n\nSummarize."
    );
    assert_eq!(requests[1].messages.last().unwrap().content, "Anything else?");
}

#[tokio::test]
async fn e2e_document_prefix_appears_exactly_once() {
    let provider = Arc::new(ScriptedProvider::echo());
    let chat = chat(provider);
    let mut session = ConversationSession::new(SYSTEM_PROMPT);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");
    std::fs::write(&path, "Page one.\x0cPage two.").unwrap();
    let doc = Document::load(&path, &PlainTextExtractor).unwrap();
    assert_eq!(doc.text, "Page one.Page two.");

    for i in 0..6 {
        chat.submit(&mut session, &format!("turn {i}"), Some(&doc))
            .await
            .unwrap();
    }

    let merged_user_messages = session
        .messages()
        .iter()
        .filter(|m| m.role == Role::User && m.content.starts_with(DOCUMENT_PREFIX))
        .count();
    assert_eq!(merged_user_messages, 1);
    // The raw inputs are kept without the document text.
    assert!(session.past_inputs().iter().all(|p| !p.contains("Page one.")));
}

#[tokio::test]
async fn e2e_no_document_passes_text_through() {
    let provider = Arc::new(ScriptedProvider::echo());
    let chat = chat(provider.clone());
    let mut session = ConversationSession::new(SYSTEM_PROMPT);

    for q in ["Hello", "Still there?"] {
        let outcome = chat.submit(&mut session, q, None).await.unwrap();
        assert_eq!(outcome.sent_prompt, q);
    }
    assert!(!session.is_document_merged());
}

// ── Reset ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_reset_is_total_and_idempotent() {
    let provider = Arc::new(ScriptedProvider::texts(&["a", "b"], 500));
    let chat = chat(provider);
    let mut session = ConversationSession::new(SYSTEM_PROMPT);
    let doc = Document::new("report.pdf", "Revenue grew 10%.");

    chat.submit(&mut session, "Summarize.", Some(&doc)).await.unwrap();
    chat.submit(&mut session, "More.", Some(&doc)).await.unwrap();
    assert!(session.total_cost() > 0.0);

    for _ in 0..2 {
        session.reset("A new prompt.");
        assert_eq!(session.total_cost(), 0.0);
        assert!(session.past_inputs().is_empty());
        assert!(session.generated_outputs().is_empty());
        assert!(session.model_names().is_empty());
        assert!(session.token_counts().is_empty());
        assert!(session.turn_costs().is_empty());
        assert_eq!(session.messages(), &[Message::system("A new prompt.")]);
        assert!(!session.is_document_merged());
    }
}

// ── Export ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_export_round_trip_preserves_order() {
    let provider = Arc::new(ScriptedProvider::texts(&["first reply", "second reply"], 20));
    let chat = chat(provider);
    let mut session = ConversationSession::new(SYSTEM_PROMPT);
    let doc = Document::new("report.pdf", "Revenue grew 10%.");

    chat.submit(&mut session, "Summarize.", Some(&doc)).await.unwrap();
    chat.submit(&mut session, "Thanks", None).await.unwrap();

    let export = session.download_conversation().unwrap();
    assert_eq!(export.file_name, "conversation.json");
    assert_eq!(export.media_type, "text/json");
    assert_eq!(import_messages(&export.bytes).unwrap(), session.messages());

    let dir = tempfile::tempdir().unwrap();
    let written = export_to_path(&session, dir.path()).unwrap();
    let on_disk = import_messages(&std::fs::read(written).unwrap()).unwrap();
    assert_eq!(on_disk, session.messages());

    let raw: serde_json::Value = serde_json::from_slice(&export.bytes).unwrap();
    assert_eq!(raw[0]["role"], "system");
    assert_eq!(raw[2], serde_json::json!({"role": "assistant", "content": "first reply"}));
}

// ── Error recovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_rate_limit_is_shown_and_session_survives() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ApiError::rate_limited("rate limited").with_status(429)),
        Ok(text_response("Recovered.", 60)),
    ]));
    let chat = chat(provider.clone());
    let mut session = ConversationSession::new(SYSTEM_PROMPT);

    let failed = chat.submit(&mut session, "Summarize.", None).await.unwrap();
    assert_eq!(failed.reply, "The API could not handle this content: rate limited");
    assert_eq!(
        session.messages().last().unwrap(),
        &Message::assistant("The API could not handle this content: rate limited")
    );
    assert_eq!(session.token_counts(), vec![0]);
    assert_eq!(session.total_cost(), 0.0);

    let next = chat.submit(&mut session, "Try again.", None).await.unwrap();
    assert!(!next.is_error());
    assert_eq!(session.messages().len(), 5);

    // The retry still sees the failed exchange in its history.
    let second_request = &provider.requests()[1];
    assert_eq!(second_request.messages.len(), 4);
    assert!(second_request.messages[2].content.starts_with("The API could not handle"));
}

#[tokio::test]
async fn e2e_failed_first_turn_still_consumes_document_merge() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ApiError::network("connection reset")),
        Ok(text_response("ok", 10)),
    ]));
    let chat = chat(provider.clone());
    let mut session = ConversationSession::new(SYSTEM_PROMPT);
    let doc = Document::new("report.pdf", "Revenue grew 10%.");

    chat.submit(&mut session, "Summarize.", Some(&doc)).await.unwrap();
    let second = chat.submit(&mut session, "Again.", Some(&doc)).await.unwrap();

    assert!(session.is_document_merged());
    assert_eq!(second.sent_prompt, "Again.");
    // The merged text is in history, so the document still reaches the model.
    assert!(provider.requests()[1].messages[1].content.starts_with(DOCUMENT_PREFIX));
}

// ── Isolation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_sessions_sharing_a_service_are_isolated() {
    let provider = Arc::new(ScriptedProvider::echo());
    let chat = chat(provider);
    let mut alice = ConversationSession::new(SYSTEM_PROMPT);
    let mut bob = ConversationSession::new(SYSTEM_PROMPT);
    let doc = Document::new("report.pdf", "Revenue grew 10%.");

    chat.submit(&mut alice, "Summarize.", Some(&doc)).await.unwrap();
    chat.submit(&mut bob, "Hi", None).await.unwrap();
    chat.submit(&mut bob, "Summarize.", Some(&doc)).await.unwrap();

    assert_eq!(alice.len(), 1);
    assert_eq!(bob.len(), 2);
    assert!(alice.is_document_merged());
    assert!(bob.is_document_merged());
    assert!(bob.messages()[3].content.starts_with(DOCUMENT_PREFIX));
}
