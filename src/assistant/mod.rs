//! Thin voice-assistant adapter over the dispatch engine.
//!
//! Maps platform requests (launch, query, help, new topic, stop, session
//! end) to spoken replies. Intent parsing and speech synthesis belong to the
//! host platform; this module only decides what to say and keeps the
//! [`SessionStore`] up to date.

pub mod phrases;

use std::sync::Arc;

use tracing::{debug, info};

use crate::dispatch::{DispatchEngine, GENERIC_APOLOGY, pick};
use crate::session::{SessionRecord, SessionState, SessionStore};
use crate::types::{FailureKind, Outcome};

/// A request from the host platform, already routed by intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantRequest {
    Launch,
    Query(String),
    Help,
    NewTopic,
    Stop,
    SessionEnded,
}

/// What to say back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenReply {
    pub speech: String,
    /// Said if the user stays silent; `None` when the session ends.
    pub reprompt: Option<String>,
    pub end_session: bool,
}

impl SpokenReply {
    fn ask(speech: impl Into<String>, reprompt: impl Into<String>) -> Self {
        Self {
            speech: speech.into(),
            reprompt: Some(reprompt.into()),
            end_session: false,
        }
    }

    fn tell(speech: impl Into<String>) -> Self {
        Self {
            speech: speech.into(),
            reprompt: None,
            end_session: true,
        }
    }
}

/// Request handlers for one deployment.
pub struct Assistant {
    engine: Arc<DispatchEngine>,
    store: Arc<dyn SessionStore>,
}

impl Assistant {
    pub fn new(engine: Arc<DispatchEngine>, store: Arc<dyn SessionStore>) -> Self {
        Self { engine, store }
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// Current stored state of a conversation.
    pub fn session(&self, conversation_id: &str) -> Option<SessionState> {
        self.store.load(conversation_id).map(|r| r.state)
    }

    /// Handle one request for `conversation_id`.
    ///
    /// Returns `None` only for [`AssistantRequest::SessionEnded`].
    pub async fn handle(
        &self,
        conversation_id: &str,
        request: AssistantRequest,
    ) -> Option<SpokenReply> {
        debug!(conversation_id, ?request, "assistant request");
        let reply = match request {
            AssistantRequest::Launch => self.launch(conversation_id),
            AssistantRequest::Query(text) => self.query(conversation_id, &text).await,
            AssistantRequest::Help => SpokenReply::ask(phrases::HELP, phrases::HELP_REPROMPT),
            AssistantRequest::NewTopic => self.new_topic(conversation_id),
            AssistantRequest::Stop => SpokenReply::tell(phrases::GOODBYE),
            AssistantRequest::SessionEnded => {
                self.session_ended(conversation_id);
                return None;
            }
        };
        Some(reply)
    }

    fn launch(&self, conversation_id: &str) -> SpokenReply {
        self.store.save(
            conversation_id,
            SessionRecord::new(self.engine.new_session()),
        );
        info!(conversation_id, "session started");
        SpokenReply::ask(phrases::WELCOME, self.reprompt())
    }

    async fn query(&self, conversation_id: &str, text: &str) -> SpokenReply {
        let question = text.trim();
        if question.is_empty() {
            return SpokenReply::ask(phrases::PLEASE_REPEAT, self.reprompt());
        }

        let mut record = self.record(conversation_id);
        let turn = self.engine.respond(&mut record.state, question).await;
        record.topic_restarted = false;
        self.store.save(conversation_id, record);

        match turn.outcome {
            Outcome::Success(answer) => SpokenReply::ask(answer, self.reprompt()),
            Outcome::Failure(FailureKind::Connection) => {
                let retry = self.choose(phrases::RETRY_PROMPTS);
                SpokenReply::ask(retry, retry)
            }
            Outcome::Failure(FailureKind::Other) => {
                SpokenReply::ask(GENERIC_APOLOGY, self.reprompt())
            }
        }
    }

    fn new_topic(&self, conversation_id: &str) -> SpokenReply {
        let mut record = self.record(conversation_id);
        let reply = if record.topic_restarted {
            record.topic_restarted = false;
            SpokenReply::ask(phrases::ASK_TOPIC, self.reprompt())
        } else {
            record.state.clear_history();
            record.topic_restarted = true;
            SpokenReply::ask(phrases::NEW_TOPIC, self.reprompt())
        };
        self.store.save(conversation_id, record);
        reply
    }

    fn session_ended(&self, conversation_id: &str) {
        let provider = self
            .store
            .load(conversation_id)
            .and_then(|r| r.state.current_provider().map(str::to_string));
        info!(
            conversation_id,
            provider = provider.as_deref().unwrap_or("unknown"),
            "session ended"
        );
        self.store.discard(conversation_id);
    }

    fn record(&self, conversation_id: &str) -> SessionRecord {
        self.store
            .load(conversation_id)
            .unwrap_or_else(|| SessionRecord::new(self.engine.new_session()))
    }

    fn reprompt(&self) -> &'static str {
        self.choose(phrases::REPROMPTS)
    }

    fn choose(&self, options: &[&'static str]) -> &'static str {
        pick(self.engine.picker(), options)
            .copied()
            .unwrap_or(phrases::REPROMPTS[0])
    }
}
