//! Chat subsystem: one turn = extract name hint → build context → call the
//! provider → commit.
//!
//! Nothing is committed until the provider answers. A failed call leaves
//! the transcript and memory exactly as they were, so the session stays
//! usable and the caller decides how to show the error.

pub mod context;
pub mod name_hint;
pub mod prompt;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::llm::{LlmProvider, ProviderError};
use crate::subsystems::memory::SessionRegistry;
use crate::subsystems::memory::store::MessagePair;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("unknown session: {0}")]
    UnknownSession(String),
    #[error("{source}")]
    Provider {
        session_id: String,
        #[source]
        source: ProviderError,
    },
}

impl ChatError {
    /// Stable short code surfaced to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::EmptyMessage => "empty_message",
            ChatError::UnknownSession(_) => "not_found",
            ChatError::Provider { source, .. } => source.kind(),
        }
    }

    /// Session the failed turn belonged to, when one was opened.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            ChatError::Provider { session_id, .. } => Some(session_id),
            ChatError::UnknownSession(id) => Some(id),
            ChatError::EmptyMessage => None,
        }
    }
}

/// Result of a successful turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub session_id: String,
    pub reply: String,
    pub transcript: Vec<MessagePair>,
}

/// Read-only snapshot of a session for display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub transcript: Vec<MessagePair>,
}

/// Chat entry point shared by every channel.
pub struct ChatService {
    provider: LlmProvider,
    sessions: Arc<SessionRegistry>,
    system_prompt: String,
    context_window: Option<usize>,
}

impl ChatService {
    pub fn new(
        provider: LlmProvider,
        sessions: Arc<SessionRegistry>,
        system_prompt: String,
        context_window: Option<usize>,
    ) -> Self {
        Self { provider, sessions, system_prompt, context_window }
    }

    /// Build from config: the system prompt comes from the prompt layers.
    pub fn from_config(config: &Config, provider: LlmProvider, sessions: Arc<SessionRegistry>) -> Self {
        let system_prompt = prompt::system_prompt(&config.prompts_dir, &config.title);
        Self::new(provider, sessions, system_prompt, config.sessions.context_window)
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Run one turn for `message` in the given (or a new) session.
    pub async fn respond(&self, session_id: Option<&str>, message: &str) -> Result<TurnReply, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let (session_id, session) = self.sessions.open(session_id).await;
        let mut session = session.lock().await;

        let fact = name_hint::extract_name(message).map(|name| {
            debug!(%session_id, %name, "name hint found");
            name_hint::name_fact(&name)
        });

        let context = context::build_context(
            &self.system_prompt,
            &session.memory,
            fact.as_ref(),
            message,
            self.context_window,
        );
        debug!(%session_id, messages = context.messages().len(), "context built");
        if tracing::enabled!(tracing::Level::TRACE) {
            trace!(%session_id, context = %context.render(), "full context");
        }

        let reply = match self.provider.complete(context.messages()).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(%session_id, kind = e.kind(), error = %e, "inference call failed, turn dropped");
                session.touch();
                return Err(ChatError::Provider { session_id, source: e });
            }
        };

        if let Some(fact) = fact {
            session.memory.save_fact(fact);
        }
        session.commit_turn(MessagePair::new(message, reply.clone()));
        info!(%session_id, turns = session.transcript.len(), "turn completed");

        Ok(TurnReply {
            session_id,
            reply,
            transcript: session.transcript.render().to_vec(),
        })
    }

    /// Clear the session's transcript and memory. An unknown or missing id
    /// gets a fresh, empty session. Returns the id to use from now on.
    pub async fn reset(&self, session_id: Option<&str>) -> String {
        if let Some(id) = session_id {
            if self.sessions.reset(id).await {
                return id.to_string();
            }
        }
        self.sessions.open(None).await.0
    }

    pub async fn session(&self, session_id: &str) -> Result<SessionView, ChatError> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .ok_or_else(|| ChatError::UnknownSession(session_id.to_string()))?;
        let session = session.lock().await;
        Ok(SessionView {
            session_id: session.id.clone(),
            created_at: session.created_at,
            transcript: session.transcript.render().to_vec(),
        })
    }

    /// The session's transcript in render order.
    pub async fn transcript(&self, session_id: &str) -> Result<Vec<MessagePair>, ChatError> {
        Ok(self.session(session_id).await?.transcript)
    }
}
