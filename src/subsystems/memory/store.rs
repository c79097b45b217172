//! In-memory session state: the visible transcript and the conversation
//! memory the context is built from.
//!
//! Both are plain append-only lists, uncapped, and live only as long as the
//! owning [`Session`].

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One completed exchange: what the user sent and what the model answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePair {
    pub input: String,
    pub output: String,
}

impl MessagePair {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self { input: input.into(), output: output.into() }
    }
}

/// Ordered message pairs, in render order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pairs: Vec<MessagePair>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, pair: MessagePair) {
        self.pairs.push(pair);
    }

    pub fn reset(&mut self) {
        self.pairs.clear();
    }

    /// The pairs in insertion order.
    pub fn render(&self) -> &[MessagePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A synthetic statement injected into the conversation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact(pub String);

impl Fact {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryEntry {
    Turn(MessagePair),
    Fact(Fact),
}

/// Turns and facts in the order they were committed.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    entries: Vec<MemoryEntry>,
}

impl ConversationMemory {
    pub fn save_turn(&mut self, pair: MessagePair) {
        self.entries.push(MemoryEntry::Turn(pair));
    }

    pub fn save_fact(&mut self, fact: Fact) {
        self.entries.push(MemoryEntry::Fact(fact));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn turn_count(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e, MemoryEntry::Turn(_))).count()
    }
}

/// State for one browser session.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub transcript: Transcript,
    pub memory: ConversationMemory,
    pub created_at: DateTime<Utc>,
    last_active: Instant,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: Transcript::new(),
            memory: ConversationMemory::default(),
            created_at: Utc::now(),
            last_active: Instant::now(),
        }
    }

    /// Record a finished exchange in both the transcript and the memory.
    pub fn commit_turn(&mut self, pair: MessagePair) {
        self.memory.save_turn(pair.clone());
        self.transcript.append(pair);
        self.touch();
    }

    /// Empty the transcript and the memory; the id is kept.
    pub fn reset(&mut self) {
        self.transcript.reset();
        self.memory.clear();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn last_active(&self) -> Instant {
        self.last_active
    }
}
