//! Context construction: turns conversation memory plus the new message
//! into the exact message list sent to the provider.
//!
//! Layout: system preamble, then committed entries in order (turns as
//! user/assistant pairs, facts as system notes), then the fact extracted
//! from the current message if any, then the current message.

use std::fmt::Write as _;

use crate::llm::{ChatMessage, Role};
use crate::subsystems::memory::store::{ConversationMemory, Fact, MemoryEntry};

/// The payload for one provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    messages: Vec<ChatMessage>,
}

impl ChatContext {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Plain-text rendering (`System:` / `Human:` / `AI:` lines) for logs
    /// and assertions.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for m in &self.messages {
            let speaker = match m.role {
                Role::System => "System",
                Role::User => "Human",
                Role::Assistant => "AI",
            };
            let _ = writeln!(out, "{speaker}: {}", m.content);
        }
        out
    }
}

fn fact_message(fact: &Fact) -> ChatMessage {
    ChatMessage::system(format!("Known fact: {}.", fact.as_str()))
}

/// Build the context for `input`.
///
/// `window` keeps only the last N turns of history; facts are always kept.
/// `None` sends the full history.
pub fn build_context(
    system: &str,
    memory: &ConversationMemory,
    pending_fact: Option<&Fact>,
    input: &str,
    window: Option<usize>,
) -> ChatContext {
    let total_turns = memory.turn_count();
    let skip = window.map_or(0, |n| total_turns.saturating_sub(n));

    let mut messages = Vec::with_capacity(memory.entries().len() * 2 + 3);
    if !system.trim().is_empty() {
        messages.push(ChatMessage::system(system));
    }

    let mut turn_index = 0;
    for entry in memory.entries() {
        match entry {
            MemoryEntry::Turn(pair) => {
                if turn_index >= skip {
                    messages.push(ChatMessage::user(pair.input.clone()));
                    messages.push(ChatMessage::assistant(pair.output.clone()));
                }
                turn_index += 1;
            }
            MemoryEntry::Fact(fact) => messages.push(fact_message(fact)),
        }
    }

    if let Some(fact) = pending_fact {
        messages.push(fact_message(fact));
    }
    messages.push(ChatMessage::user(input));

    ChatContext { messages }
}
