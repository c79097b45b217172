//! Axum HTTP channel: serves the chat page and the JSON API the page talks to.
//!
//! Implements [`Component`]; `run()` drives the axum server and wires the
//! shared [`CancellationToken`] to graceful shutdown.
//!
//! ## URL layout
//!
//! ```text
//! GET  /api/health
//! POST /api/message          {"message", "session_id"?}
//! POST /api/reset            {"session_id"?}
//! GET  /api/session/{id}
//! GET  /favicon.ico          → 204
//! GET  /                     → chat page
//! ```

mod api;
mod ui;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;
use crate::subsystems::chat::ChatService;
use crate::subsystems::runtime::{Component, ComponentFuture};

/// Router state injected into every handler. Cheap to clone.
#[derive(Clone)]
pub(crate) struct AxumState {
    /// Channel identifier used in log fields.
    pub channel_id: Arc<str>,
    pub chat: Arc<ChatService>,
    /// Chat page, rendered once at startup.
    pub page: Arc<str>,
}

pub struct AxumChannel {
    channel_id: String,
    bind_addr: String,
    title: String,
    chat: Arc<ChatService>,
}

impl AxumChannel {
    pub fn new(
        channel_id: impl Into<String>,
        bind_addr: impl Into<String>,
        title: impl Into<String>,
        chat: Arc<ChatService>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            bind_addr: bind_addr.into(),
            title: title.into(),
            chat,
        }
    }
}

impl Component for AxumChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_axum(*self, shutdown))
    }
}

async fn run_axum(channel: AxumChannel, shutdown: CancellationToken) -> Result<(), AppError> {
    let AxumChannel { channel_id, bind_addr, title, chat } = channel;
    let router = build_router(AxumState {
        channel_id: Arc::from(channel_id.as_str()),
        chat,
        page: Arc::from(ui::render_page(&title)),
    });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("axum bind failed on {bind_addr}: {e}")))?;

    info!(%channel_id, %bind_addr, "chat server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("axum server error: {e}")))?;

    info!(%channel_id, "chat server shut down");
    Ok(())
}

pub(crate) fn build_router(state: AxumState) -> Router {
    Router::new()
        .route("/api/health",            get(api::health))
        .route("/api/message",           post(api::message))
        .route("/api/reset",             post(api::reset))
        .route("/api/session/{session_id}", get(api::session_detail))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .route("/",            get(ui::root))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::llm::LlmProvider;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::llm::providers::huggingface::HuggingFaceProvider;
    use crate::subsystems::memory::SessionRegistry;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn state_with(provider: LlmProvider, registry: Arc<SessionRegistry>) -> AxumState {
        AxumState {
            channel_id: Arc::from("http"),
            chat: Arc::new(ChatService::new(provider, registry, "sys".into(), None)),
            page: Arc::from(ui::render_page("Shayyan's <Chatbot>")),
        }
    }

    fn echo_router() -> Router {
        build_router(state_with(LlmProvider::Dummy(DummyProvider), Arc::new(SessionRegistry::new())))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_serves_chat_page() {
        let resp = echo_router().oneshot(get("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Shayyan&#39;s &lt;Chatbot&gt;"));
        assert!(html.contains("Clear Chat (Full Reset)"));
    }

    #[tokio::test]
    async fn favicon_is_no_content() {
        let resp = echo_router().oneshot(get("/favicon.ico")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn health_reports_provider() {
        let resp = echo_router().oneshot(get("/api/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["provider"], "dummy");
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn message_creates_session_and_replies() {
        let resp = echo_router()
            .oneshot(post_json("/api/message", json!({ "message": "Hello" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["reply"], "[echo] Hello");
        assert!(body["session_id"].as_str().is_some_and(|s| !s.is_empty()));
        assert_eq!(body["transcript"][0]["input"], "Hello");
        assert_eq!(body["transcript"][0]["output"], "[echo] Hello");
    }

    #[tokio::test]
    async fn blank_message_is_bad_request() {
        let resp = echo_router()
            .oneshot(post_json("/api/message", json!({ "message": "  " })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "empty_message");
    }

    #[tokio::test]
    async fn unknown_session_detail_is_not_found() {
        let resp = echo_router().oneshot(get("/api/session/missing")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(resp).await["error"], "not_found");
    }

    #[tokio::test]
    async fn reset_then_detail_is_empty() {
        let router = echo_router();
        let body = json_body(
            router.clone().oneshot(post_json("/api/message", json!({ "message": "Hi" }))).await.unwrap(),
        )
        .await;
        let id = body["session_id"].as_str().unwrap().to_string();

        let reset = router
            .clone()
            .oneshot(post_json("/api/reset", json!({ "session_id": id })))
            .await
            .unwrap();
        assert_eq!(reset.status(), StatusCode::OK);
        let reset_body = json_body(reset).await;
        assert_eq!(reset_body["session_id"], id.as_str());
        assert_eq!(reset_body["transcript"], json!([]));

        let detail = json_body(router.oneshot(get(&format!("/api/session/{id}"))).await.unwrap()).await;
        assert_eq!(detail["session_id"], id.as_str());
        assert!(detail["created_at"].is_string());
        assert_eq!(detail["transcript"], json!([]));
    }

    #[tokio::test]
    async fn provider_failure_is_bad_gateway_and_keeps_session() {
        let registry = Arc::new(SessionRegistry::new());
        let ok = build_router(state_with(LlmProvider::Dummy(DummyProvider), registry.clone()));
        let first = json_body(ok.oneshot(post_json("/api/message", json!({ "message": "Hello" }))).await.unwrap()).await;
        let id = first["session_id"].as_str().unwrap().to_string();

        let broken_provider = LlmProvider::HuggingFace(
            HuggingFaceProvider::new(
                "http://127.0.0.1:1/v1/chat/completions".into(),
                "test/model".into(),
                0.7,
                16,
                2,
                "hf_test".into(),
            )
            .unwrap(),
        );
        let broken = build_router(state_with(broken_provider, registry.clone()));
        let resp = broken
            .clone()
            .oneshot(post_json("/api/message", json!({ "message": "again", "session_id": id })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "transport");
        assert_eq!(body["session_id"], id.as_str());

        let detail = json_body(broken.oneshot(get(&format!("/api/session/{id}"))).await.unwrap()).await;
        assert_eq!(detail["transcript"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn provider_timeout_is_gateway_timeout() {
        let stalled = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, stalled).await.unwrap();
        });

        let slow_provider = LlmProvider::HuggingFace(
            HuggingFaceProvider::new(
                format!("http://{addr}/v1/chat/completions"),
                "test/model".into(),
                0.7,
                16,
                1,
                "hf_test".into(),
            )
            .unwrap(),
        );
        let router = build_router(state_with(slow_provider, Arc::new(SessionRegistry::new())));
        let resp = router
            .oneshot(post_json("/api/message", json!({ "message": "Hello" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "timeout");
        assert!(body["session_id"].is_string());
    }

    #[tokio::test]
    async fn malformed_body_uses_error_envelope() {
        let resp = echo_router()
            .oneshot(post_json("/api/message", json!({ "text": "no message field" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "invalid_request");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));

        let not_json = Request::builder()
            .method("POST")
            .uri("/api/reset")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = echo_router().oneshot(not_json).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "invalid_request");
    }
}
