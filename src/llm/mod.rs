//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities; clone them freely.
//! Every call is a single stateless request/response: conversation state
//! lives in the caller, which passes the complete message list each time.

pub mod providers;

use serde::Serialize;
use thiserror::Error;

// ── Messages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message of the context sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("missing API credential for provider '{0}'")]
    MissingCredential(String),
    #[error("authentication rejected: {0}")]
    Unauthorized(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("empty or missing content in response")]
    Empty,
}

impl ProviderError {
    /// Stable short code surfaced to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::UnknownProvider(_) => "unknown_provider",
            ProviderError::MissingCredential(_) => "missing_credential",
            ProviderError::Unauthorized(_) => "unauthorized",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Transport(_) => "transport",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::Remote { .. } => "remote",
            ProviderError::Malformed(_) => "malformed",
            ProviderError::Empty => "empty",
        }
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    HuggingFace(providers::huggingface::HuggingFaceProvider),
}

impl LlmProvider {
    /// Send the full message list and return the generated reply text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(messages).await,
            LlmProvider::HuggingFace(p) => p.complete(messages).await,
        }
    }

    /// Short provider name (`"dummy"`, `"huggingface"`).
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::HuggingFace(_) => "huggingface",
        }
    }

    /// Model identifier used by this provider.
    pub fn model(&self) -> &str {
        match self {
            LlmProvider::Dummy(_) => "echo",
            LlmProvider::HuggingFace(p) => p.model(),
        }
    }
}
