//! Per-conversation session state.
//!
//! A [`SessionState`] is created at conversation start, mutated once per turn
//! by the [`DispatchEngine`](crate::DispatchEngine), and handed back to the
//! [`SessionStore`] between turns. Persistence beyond one conversation is
//! not this crate's concern.

mod store;

pub use store::{MemorySessionStore, SessionRecord, SessionStore, StoreConfig};

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Maximum number of exchanges kept in [`ChatHistory`].
pub const HISTORY_CAPACITY: usize = 8;

/// One successful question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

impl Exchange {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Insertion-ordered history capped at [`HISTORY_CAPACITY`]; oldest evicted first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Exchange>", into = "Vec<Exchange>")]
pub struct ChatHistory {
    entries: VecDeque<Exchange>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an exchange, evicting the oldest beyond capacity.
    pub fn push(&mut self, exchange: Exchange) {
        self.entries.push_back(exchange);
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// The last `n` exchanges, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Exchange> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl From<Vec<Exchange>> for ChatHistory {
    fn from(entries: Vec<Exchange>) -> Self {
        let mut history = ChatHistory::new();
        for exchange in entries {
            history.push(exchange);
        }
        history
    }
}

impl From<ChatHistory> for Vec<Exchange> {
    fn from(history: ChatHistory) -> Self {
        history.entries.into()
    }
}

/// Mutable memory of one conversation.
///
/// `failed_providers` only ever holds providers that failed within the
/// current attempt chain; it is emptied on any success and whenever the
/// whole availability set has been exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    chat_history: ChatHistory,
    #[serde(default)]
    current_provider: Option<String>,
    #[serde(default)]
    failed_providers: BTreeSet<String>,
    #[serde(default)]
    forced_provider: Option<String>,
}

impl SessionState {
    /// Empty history, no current provider, nothing failed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin every turn of this session to `provider`, disabling fallback.
    pub fn with_forced_provider(mut self, provider: impl Into<String>) -> Self {
        self.forced_provider = Some(provider.into());
        self
    }

    /// Start from a known current provider.
    pub fn with_current_provider(mut self, provider: impl Into<String>) -> Self {
        self.current_provider = Some(provider.into());
        self
    }

    pub fn history(&self) -> &ChatHistory {
        &self.chat_history
    }

    pub fn current_provider(&self) -> Option<&str> {
        self.current_provider.as_deref()
    }

    pub fn failed_providers(&self) -> &BTreeSet<String> {
        &self.failed_providers
    }

    pub fn forced_provider(&self) -> Option<&str> {
        self.forced_provider.as_deref()
    }

    /// Forget the conversation so far, keeping provider state.
    pub fn clear_history(&mut self) {
        self.chat_history.clear();
    }

    pub(crate) fn record_exchange(&mut self, question: &str, answer: &str) {
        self.chat_history.push(Exchange::new(question, answer));
    }

    pub(crate) fn set_current_provider(&mut self, provider: &str) {
        self.current_provider = Some(provider.to_string());
    }

    pub(crate) fn mark_failed(&mut self, provider: &str) {
        self.failed_providers.insert(provider.to_string());
    }

    pub(crate) fn clear_failed(&mut self) {
        self.failed_providers.clear();
    }

    pub(crate) fn retain_failed(&mut self, keep: impl FnMut(&String) -> bool) {
        self.failed_providers.retain(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(i: usize) -> Exchange {
        Exchange::new(format!("q{i}"), format!("a{i}"))
    }

    #[test]
    fn history_evicts_oldest_at_capacity() {
        let mut history = ChatHistory::new();
        for i in 0..=HISTORY_CAPACITY {
            history.push(exchange(i));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next().unwrap().question, "q1");
        assert_eq!(history.iter().last().unwrap().question, "q8");
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut history = ChatHistory::new();
        for i in 0..8 {
            history.push(exchange(i));
        }
        let recent: Vec<_> = history.recent(6).map(|e| e.question.as_str()).collect();
        assert_eq!(recent, ["q2", "q3", "q4", "q5", "q6", "q7"]);
        assert_eq!(history.recent(20).count(), 8);
    }

    #[test]
    fn deserializing_oversized_history_truncates() {
        let entries: Vec<_> = (0..12).map(exchange).collect();
        let json = serde_json::to_string(&entries).unwrap();
        let history: ChatHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next().unwrap().question, "q4");
    }

    #[test]
    fn new_session_is_empty() {
        let session = SessionState::new();
        assert!(session.history().is_empty());
        assert!(session.current_provider().is_none());
        assert!(session.failed_providers().is_empty());
        assert!(session.forced_provider().is_none());
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut session = SessionState::new().with_forced_provider("openai");
        session.record_exchange("hola", "buenas");
        session.set_current_provider("openai");
        let json = serde_json::to_string(&session).unwrap();
        let restored: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn clear_history_keeps_provider() {
        let mut session = SessionState::new().with_current_provider("github");
        session.record_exchange("q", "a");
        session.clear_history();
        assert!(session.history().is_empty());
        assert_eq!(session.current_provider(), Some("github"));
    }
}
