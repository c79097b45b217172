//! Axum handlers for `/api/*` routes.
//!
//! Each handler receives [`AxumState`] via [`axum::extract::State`] and
//! returns an axum [`Response`]. Failures use the same JSON envelope:
//! `{"error": <kind>, "message": <text>}`, plus `session_id` when known.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::AxumState;
use crate::llm::ProviderError;
use crate::subsystems::chat::ChatError;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct MessageRequest {
    message: String,
    session_id: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct ResetRequest {
    #[serde(default)]
    session_id: Option<String>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

/// Malformed or non-JSON request bodies get the same envelope as chat errors.
fn rejection_response(rejection: JsonRejection) -> Response {
    (rejection.status(), json_error("invalid_request", rejection.body_text())).into_response()
}

fn status_for(err: &ChatError) -> StatusCode {
    match err {
        ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
        ChatError::UnknownSession(_) => StatusCode::NOT_FOUND,
        ChatError::Provider { source: ProviderError::Timeout(_), .. } => StatusCode::GATEWAY_TIMEOUT,
        ChatError::Provider { .. } => StatusCode::BAD_GATEWAY,
    }
}

fn chat_error_response(err: &ChatError) -> Response {
    let Json(mut body) = json_error(err.kind(), err);
    if let Some(id) = err.session_id() {
        body["session_id"] = json!(id);
    }
    (status_for(err), Json(body)).into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/health
pub(super) async fn health(State(state): State<AxumState>) -> Response {
    let sessions = state.chat.sessions().len().await;
    let provider = state.chat.provider();
    Json(json!({
        "status": "ok",
        "provider": provider.name(),
        "model": provider.model(),
        "sessions": sessions,
    }))
    .into_response()
}

/// POST /api/message
pub(super) async fn message(
    State(state): State<AxumState>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return rejection_response(rejection),
    };
    debug!(channel_id = %state.channel_id, session_id = ?req.session_id, "message received");
    match state.chat.respond(req.session_id.as_deref(), &req.message).await {
        Ok(turn) => Json(turn).into_response(),
        Err(e) => {
            if !matches!(e, ChatError::EmptyMessage) {
                warn!(channel_id = %state.channel_id, kind = e.kind(), "message failed: {e}");
            }
            chat_error_response(&e)
        }
    }
}

/// POST /api/reset
pub(super) async fn reset(
    State(state): State<AxumState>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return rejection_response(rejection),
    };
    let session_id = state.chat.reset(req.session_id.as_deref()).await;
    Json(json!({ "session_id": session_id, "transcript": [] })).into_response()
}

/// GET /api/session/{session_id}
pub(super) async fn session_detail(State(state): State<AxumState>, Path(session_id): Path<String>) -> Response {
    match state.chat.session(&session_id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => chat_error_response(&e),
    }
}
