//! Hugging Face inference provider.
//!
//! Talks to the router's OpenAI-compatible `/v1/chat/completions` endpoint,
//! with the model repository name as `model`. The wire types are private to
//! this module; callers only see message lists in and reply text out.
//!
//! Failures are classified into the [`ProviderError`] taxonomy. There is no
//! retry: one call, one request.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{ChatMessage, ProviderError};

/// Adapter for the hosted text-generation endpoint.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Clone)]
pub struct HuggingFaceProvider {
    client: Client,
    api_base_url: String,
    repo_id: String,
    temperature: f32,
    max_new_tokens: u32,
    timeout_seconds: u64,
    api_key: String,
}

// Hand-written so the bearer token never reaches a log line.
impl std::fmt::Debug for HuggingFaceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceProvider")
            .field("api_base_url", &self.api_base_url)
            .field("repo_id", &self.repo_id)
            .field("temperature", &self.temperature)
            .field("max_new_tokens", &self.max_new_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish_non_exhaustive()
    }
}

impl HuggingFaceProvider {
    /// Build a provider; `api_key` is sent as `Authorization: Bearer <key>`.
    pub fn new(
        api_base_url: String,
        repo_id: String,
        temperature: f32,
        max_new_tokens: u32,
        timeout_seconds: u64,
        api_key: String,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url,
            repo_id,
            temperature,
            max_new_tokens,
            timeout_seconds,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.repo_id
    }

    /// Send the message list and return the first choice's text, trimmed.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let payload = ChatCompletionRequest {
            model: &self.repo_id,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_new_tokens,
            stream: false,
        };

        debug!(
            model = %self.repo_id,
            temperature = self.temperature,
            max_tokens = self.max_new_tokens,
            messages = messages.len(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let response = self
            .client
            .post(&self.api_base_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Malformed(e.to_string())
        })?;

        debug!(choices = parsed.choices.len(), "received LLM response");
        trace!(response = %body, "full LLM response payload");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ProviderError::Empty)
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        error!(url = %self.api_base_url, error = %e, timeout = e.is_timeout(), "LLM HTTP request failed (transport)");
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout_seconds)
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error envelope: the router answers with either a bare string or an
/// OpenAI-style object under `error`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Text(String),
    Detailed { message: String },
}

/// Map a non-2xx response into the provider error taxonomy.
fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error: ErrorField::Text(m) }) => m,
        Ok(ErrorEnvelope { error: ErrorField::Detailed { message } }) => message,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body.trim().to_string(),
    };

    error!(%status, %message, "LLM request returned HTTP error");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(message),
        _ => ProviderError::Remote { status: status.as_u16(), message },
    }
}
