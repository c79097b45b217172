//! Memory subsystem: per-session conversation state keyed by session id.
//!
//! Sessions are created on first interaction, handed out as
//! `Arc<Mutex<Session>>`, and torn down by an explicit reset/remove or by
//! the idle sweep. Nothing is written to disk.
//!
//! The per-session mutex is held for a whole chat turn, so turns in one
//! session run one at a time while separate sessions proceed in parallel.

pub mod store;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::AppError;
use crate::subsystems::runtime::{Component, ComponentFuture};
use store::Session;

pub type SessionRef = Arc<Mutex<Session>>;

/// Owner of every live session. Constructed once, shared via `Arc`.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionRef>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `requested_id`, or create one.
    ///
    /// Unknown or expired ids are not adopted: a fresh id is generated, and
    /// the caller must hand the returned id back to the client.
    pub async fn open(&self, requested_id: Option<&str>) -> (String, SessionRef) {
        if let Some(id) = requested_id {
            if let Some(existing) = self.get(id).await {
                return (id.to_string(), existing);
            }
            debug!(requested = %id, "unknown session id, starting a new session");
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(Session::new(id.clone())));
        self.sessions.write().await.insert(id.clone(), session.clone());
        info!(session_id = %id, "session created");
        (id, session)
    }

    pub async fn get(&self, id: &str) -> Option<SessionRef> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Empty a session's transcript and memory. Returns `false` if unknown.
    pub async fn reset(&self, id: &str) -> bool {
        let Some(session) = self.get(id).await else {
            return false;
        };
        session.lock().await.reset();
        info!(session_id = %id, "session reset");
        true
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many went.
    ///
    /// A session that is locked or still referenced outside the registry is
    /// mid-turn, so it is skipped.
    pub async fn sweep_expired(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            if Arc::strong_count(session) > 1 {
                return true;
            }
            match session.try_lock() {
                Ok(s) => {
                    let keep = now.saturating_duration_since(s.last_active()) <= ttl;
                    if !keep {
                        debug!(session_id = %id, created_at = %s.created_at, "session expired");
                    }
                    keep
                }
                Err(_) => true,
            }
        });
        before - sessions.len()
    }
}

// ── Sweeper ───────────────────────────────────────────────────────────────────

/// Background component that periodically expires idle sessions.
pub struct SessionSweeper {
    registry: Arc<SessionRegistry>,
    ttl: Duration,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(registry: Arc<SessionRegistry>, ttl: Duration, interval: Duration) -> Self {
        Self { registry, ttl, interval }
    }
}

impl Component for SessionSweeper {
    fn id(&self) -> &str {
        "session-sweeper"
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_sweeper(self.registry, self.ttl, self.interval, shutdown))
    }
}

async fn run_sweeper(
    registry: Arc<SessionRegistry>,
    ttl: Duration,
    interval: Duration,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // consume the first (immediate) tick
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let removed = registry.sweep_expired(ttl).await;
                if removed > 0 {
                    let remaining = registry.len().await;
                    info!(removed, remaining, "expired idle sessions");
                }
            }
        }
    }
    debug!("session sweeper stopped");
    Ok(())
}
