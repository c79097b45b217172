//! End-to-end chat turns against a local stand-in for the inference endpoint.

use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use chatbridge::llm::LlmProvider;
use chatbridge::llm::providers::huggingface::HuggingFaceProvider;
use chatbridge::subsystems::chat::{ChatError, ChatService};
use chatbridge::subsystems::memory::SessionRegistry;

type Captured = Arc<Mutex<Vec<Value>>>;

/// Records every request body and answers `reply N` (N counts from 1).
async fn recording_endpoint(State(captured): State<Captured>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let n = {
        let mut bodies = captured.lock().unwrap();
        bodies.push(body);
        bodies.len()
    };
    let reply = json!({ "choices": [{ "message": { "role": "assistant", "content": format!("reply {n}") } }] });
    (StatusCode::OK, Json(reply))
}

async fn start_endpoint(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1/chat/completions")
}

fn service(url: String, window: Option<usize>) -> ChatService {
    let provider = HuggingFaceProvider::new(
        url,
        "deepseek-ai/DeepSeek-V3-0324".into(),
        0.7,
        2000,
        5,
        "hf_test".into(),
    )
    .unwrap();
    ChatService::new(
        LlmProvider::HuggingFace(provider),
        Arc::new(SessionRegistry::new()),
        "You are a test bot.".into(),
        window,
    )
}

async fn recording_service(window: Option<usize>) -> (ChatService, Captured) {
    let captured: Captured = Arc::default();
    let router = Router::new()
        .route("/v1/chat/completions", post(recording_endpoint))
        .with_state(captured.clone());
    (service(start_endpoint(router).await, window), captured)
}

fn contents(body: &Value) -> Vec<String> {
    body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_hello_then_name_then_recall() {
    let (svc, captured) = recording_service(None).await;

    let first = svc.respond(None, "Hello").await.unwrap();
    assert_eq!(first.reply, "reply 1");
    assert_eq!(first.transcript.len(), 1);
    let id = first.session_id;

    let second = svc.respond(Some(&id), "My name is Bob").await.unwrap();
    assert_eq!(second.transcript.len(), 2);
    assert_eq!(second.transcript[1].input, "My name is Bob");

    svc.respond(Some(&id), "What is my name?").await.unwrap();

    let bodies = captured.lock().unwrap();
    assert_eq!(bodies.len(), 3);
    assert_eq!(bodies[0]["model"], "deepseek-ai/DeepSeek-V3-0324");
    assert_eq!(bodies[0]["max_tokens"], 2000);
    assert_eq!(contents(&bodies[0]), ["You are a test bot.", "Hello"]);

    // Fact is in the context of the very turn that introduced it.
    let second_ctx = contents(&bodies[1]);
    assert!(second_ctx.iter().any(|c| c.contains("the user's name is Bob")));
    assert_eq!(second_ctx.last().unwrap(), "My name is Bob");

    let third_ctx = contents(&bodies[2]);
    assert_eq!(
        third_ctx,
        [
            "You are a test bot.",
            "Hello",
            "reply 1",
            "Known fact: the user's name is Bob.",
            "My name is Bob",
            "reply 2",
            "What is my name?",
        ]
    );
}

#[tokio::test]
async fn test_reset_starts_from_scratch() {
    let (svc, captured) = recording_service(None).await;
    let id = svc.respond(None, "my name is Alice").await.unwrap().session_id;

    assert_eq!(svc.reset(Some(&id)).await, id);
    assert!(svc.transcript(&id).await.unwrap().is_empty());

    svc.respond(Some(&id), "Who am I?").await.unwrap();
    let bodies = captured.lock().unwrap();
    let after_reset = contents(&bodies[1]);
    assert_eq!(after_reset, ["You are a test bot.", "Who am I?"]);
}

#[tokio::test]
async fn test_sessions_do_not_share_memory() {
    let (svc, captured) = recording_service(None).await;
    let a = svc.respond(None, "My name is Bob").await.unwrap().session_id;
    let b = svc.respond(None, "Hi there").await.unwrap().session_id;
    assert_ne!(a, b);

    svc.respond(Some(&b), "Who am I?").await.unwrap();
    let bodies = captured.lock().unwrap();
    assert!(contents(&bodies[2]).iter().all(|c| !c.contains("Bob")));
    drop(bodies);

    assert_eq!(svc.transcript(&a).await.unwrap().len(), 1);
    assert_eq!(svc.transcript(&b).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_context_window_keeps_facts() {
    let (svc, captured) = recording_service(Some(1)).await;
    let id = svc.respond(None, "my name is Dana").await.unwrap().session_id;
    svc.respond(Some(&id), "first").await.unwrap();
    svc.respond(Some(&id), "second").await.unwrap();

    let bodies = captured.lock().unwrap();
    assert_eq!(
        contents(&bodies[2]),
        ["You are a test bot.", "Known fact: the user's name is Dana.", "first", "reply 2", "second"]
    );
}

#[tokio::test]
async fn test_rejected_credential_keeps_transcript() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::UNAUTHORIZED, r#"{"error":"Invalid credentials in Authorization header"}"#) }),
    );
    let failing = service(start_endpoint(router).await, None);

    let err = failing.respond(None, "My name is Bob").await.unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
    let id = err.session_id().unwrap().to_string();
    assert!(matches!(err, ChatError::Provider { .. }));
    assert!(failing.transcript(&id).await.unwrap().is_empty());
}
