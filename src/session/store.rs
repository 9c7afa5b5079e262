//! Session store: conversation id → session record.
//!
//! The voice platform serializes turns of one conversation, so a store only
//! needs to hand out copies and accept them back; it never sees concurrent
//! writers for the same id.

use std::time::Duration;

use moka::sync::Cache;

use super::SessionState;

/// What the store keeps per conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub state: SessionState,
    /// Set by a "new topic" request; cleared by the next one or by a query.
    pub topic_restarted: bool,
}

impl SessionRecord {
    pub fn new(state: SessionState) -> Self {
        Self {
            state,
            topic_restarted: false,
        }
    }
}

/// Supplies and persists session records keyed by conversation id.
pub trait SessionStore: Send + Sync {
    fn load(&self, conversation_id: &str) -> Option<SessionRecord>;
    fn save(&self, conversation_id: &str, record: SessionRecord);
    fn discard(&self, conversation_id: &str);
}

/// Configuration for [`MemorySessionStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of live conversations. Default: 10,000.
    pub max_sessions: u64,
    /// Conversations idle for longer than this are dropped. Default: 1 hour.
    pub idle_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: 10_000,
            idle_timeout: Duration::from_secs(3600),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_sessions(mut self, n: u64) -> Self {
        self.max_sessions = n;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

/// In-process session store with bounded size and idle expiry.
pub struct MemorySessionStore {
    cache: Cache<String, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new(config: &StoreConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_idle(config.idle_timeout)
            .build();
        Self { cache }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, conversation_id: &str) -> Option<SessionRecord> {
        self.cache.get(conversation_id)
    }

    fn save(&self, conversation_id: &str, record: SessionRecord) {
        self.cache.insert(conversation_id.to_string(), record);
    }

    fn discard(&self, conversation_id: &str) {
        self.cache.invalidate(conversation_id);
    }
}
