//! Dispatch engine: provider selection and the fallback state machine.
//!
//! # Turn flow
//!
//! ```text
//! SELECT ──► ATTEMPT ──► success ─────────────────────────────► SUCCESS
//!                │
//!                └─► connection failure (not forced)
//!                        │ mark failed
//!                        ▼
//!                ┌──► pick from available \ failed ──► none left ──┐
//!                │        │                                        │
//!                │        ▼                                        ▼
//!                │     ATTEMPT ──► success ──► SUCCESS          EXHAUSTED
//!                │        │
//!                └────────┘ failure: mark failed (at most N rounds)
//! ```
//!
//! - A forced provider is used unconditionally, every turn, with fallback off.
//! - Non-connection failures of the first attempt end the turn immediately.
//! - Any success clears the failed set and records the exchange in history.
//! - Exhaustion clears the failed set and picks a fresh provider for the
//!   next turn.
//!
//! Attempts are strictly sequential; worst-case latency is the sum of the
//! attempted providers' timeouts.

mod builder;
pub mod select;

pub use builder::DispatchEngineBuilder;
pub use select::{Picker, RandomPicker, SeededPicker, pick};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::prompt::Persona;
use crate::providers::{Availability, Transport, build_request, normalize};
use crate::session::{ChatHistory, SessionState};
use crate::telemetry;
use crate::types::{FailureKind, Outcome, Turn};
use crate::{CharlaError, Result};

/// Spoken when no provider could answer because of connection-class failures.
pub const UNAVAILABLE_APOLOGY: &str = "Lo siento, todos los servicios de inteligencia artificial están temporalmente no disponibles. Por favor, inténtalo de nuevo en unos minutos.";

/// Spoken when a provider failed for a reason fallback cannot fix.
pub const GENERIC_APOLOGY: &str =
    "Lo siento, no pude generar una respuesta en este momento. ¿Puedes intentar con otra pregunta?";

/// Dispatch settings.
///
/// ```toml
/// [dispatch]
/// forced_provider = "cerebras_llama33_70b"
/// fallback_attempts = 3
/// history_window = 6
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Provider every new session is pinned to. Disables fallback.
    #[serde(default)]
    pub forced_provider: Option<String>,
    /// Alternate providers tried after a connection failure. Default: 3.
    #[serde(default = "default_fallback_attempts")]
    pub fallback_attempts: usize,
    /// Exchanges of history sent with each question. Default: 6.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            forced_provider: None,
            fallback_attempts: default_fallback_attempts(),
            history_window: default_history_window(),
        }
    }
}

fn default_fallback_attempts() -> usize {
    3
}

fn default_history_window() -> usize {
    6
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forced_provider(mut self, provider: impl Into<String>) -> Self {
        self.forced_provider = Some(provider.into());
        self
    }

    pub fn fallback_attempts(mut self, n: usize) -> Self {
        self.fallback_attempts = n;
        self
    }

    pub fn history_window(mut self, n: usize) -> Self {
        self.history_window = n;
        self
    }
}

/// Answers questions by dispatching them to available providers.
///
/// Holds only immutable state; per-conversation memory lives in the
/// [`SessionState`] passed to [`respond`](Self::respond).
pub struct DispatchEngine {
    availability: Arc<Availability>,
    transport: Arc<dyn Transport>,
    picker: Arc<dyn Picker>,
    persona: Persona,
    config: DispatchConfig,
}

impl DispatchEngine {
    /// Create a builder over a resolved availability set.
    pub fn builder(availability: Arc<Availability>) -> DispatchEngineBuilder {
        DispatchEngineBuilder::new(availability)
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The engine's source of randomness.
    pub fn picker(&self) -> &dyn Picker {
        self.picker.as_ref()
    }

    /// A fresh session carrying the configured forced provider, if any.
    pub fn new_session(&self) -> SessionState {
        match &self.config.forced_provider {
            Some(provider) => SessionState::new().with_forced_provider(provider.as_str()),
            None => SessionState::new(),
        }
    }

    /// Answer `question` within `session`, updating it in place.
    ///
    /// Never fails: every transport and parse error is mapped into the
    /// returned [`Turn`]'s outcome.
    #[instrument(skip(self, session, question), fields(forced = session.forced_provider()))]
    pub async fn respond(&self, session: &mut SessionState, question: &str) -> Turn {
        session.retain_failed(|id| self.availability.contains(id));

        let forced = self.active_forced_provider(session);
        let selected = match &forced {
            Some(provider) => {
                session.clear_failed();
                provider.clone()
            }
            None => self.select(session),
        };
        session.set_current_provider(&selected);
        info!(provider = %selected, "dispatching question");

        let mut attempts = 1;
        let mut answered_by = selected.clone();
        let mut result = self.attempt(&selected, session.history(), question).await;

        let starts_fallback = forced.is_none()
            && matches!(&result, Err(e) if e.is_connection_class())
            && !session.failed_providers().contains(&selected);

        if starts_fallback {
            warn!(provider = %selected, "connection failure, starting fallback");
            metrics::counter!(telemetry::FALLBACKS_TOTAL, "provider" => selected.clone())
                .increment(1);
            session.mark_failed(&selected);

            for round in 1..=self.config.fallback_attempts {
                let Some(next) = self.pick_excluding(session.failed_providers()) else {
                    warn!("no providers left for fallback");
                    break;
                };
                session.set_current_provider(&next);
                info!(provider = %next, round, "fallback attempt");

                attempts += 1;
                result = self.attempt(&next, session.history(), question).await;
                answered_by = next;

                match &result {
                    Ok(_) => {
                        info!(provider = %answered_by, round, "fallback succeeded");
                        break;
                    }
                    Err(_) => session.mark_failed(&answered_by),
                }
            }

            if let Err(e) = &result {
                session.clear_failed();
                let fresh = self.pick_any();
                session.set_current_provider(&fresh);
                error!(attempts, next_provider = %fresh, "all fallback providers failed");
                metrics::counter!(telemetry::FALLBACKS_EXHAUSTED_TOTAL).increment(1);
                return finish(Turn {
                    text: UNAVAILABLE_APOLOGY.to_string(),
                    outcome: Outcome::Failure(FailureKind::Connection),
                    provider: Some(answered_by),
                    attempts,
                    diagnostic: Some(e.to_string()),
                });
            }
        }

        let turn = match result {
            Ok(answer) => {
                session.clear_failed();
                session.set_current_provider(&answered_by);
                session.record_exchange(question, &answer);
                Turn {
                    text: answer.clone(),
                    outcome: Outcome::Success(answer),
                    provider: Some(answered_by),
                    attempts,
                    diagnostic: None,
                }
            }
            Err(e) => {
                let kind = e.failure_kind();
                let text = match kind {
                    FailureKind::Connection => UNAVAILABLE_APOLOGY,
                    FailureKind::Other => {
                        warn!(provider = %answered_by, error = %e, "non-connection failure");
                        GENERIC_APOLOGY
                    }
                };
                Turn {
                    text: text.to_string(),
                    outcome: Outcome::Failure(kind),
                    provider: Some(answered_by),
                    attempts,
                    diagnostic: Some(e.to_string()),
                }
            }
        };
        finish(turn)
    }

    /// The session's forced provider, if it is actually available.
    fn active_forced_provider(&self, session: &SessionState) -> Option<String> {
        let forced = session.forced_provider()?;
        if self.availability.contains(forced) {
            Some(forced.to_string())
        } else {
            warn!(provider = forced, "forced provider is not available, ignoring");
            None
        }
    }

    /// Keep the current provider unless it is unset, unavailable, or failed.
    fn select(&self, session: &mut SessionState) -> String {
        if let Some(current) = session.current_provider()
            && self.availability.contains(current)
            && !session.failed_providers().contains(current)
        {
            return current.to_string();
        }

        match self.pick_excluding(session.failed_providers()) {
            Some(provider) => provider,
            None => {
                session.clear_failed();
                self.pick_any()
            }
        }
    }

    /// Random provider from the availability set minus `failed`.
    fn pick_excluding(&self, failed: &BTreeSet<String>) -> Option<String> {
        let candidates: Vec<&str> = self
            .availability
            .ids()
            .filter(|id| !failed.contains(*id))
            .collect();
        pick(self.picker.as_ref(), &candidates).map(|id| id.to_string())
    }

    /// Random provider from the full availability set.
    fn pick_any(&self) -> String {
        let candidates: Vec<&str> = self.availability.ids().collect();
        pick(self.picker.as_ref(), &candidates)
            .copied()
            .unwrap_or_else(|| self.availability.primary())
            .to_string()
    }

    /// One request to one provider, normalized.
    async fn attempt(&self, id: &str, history: &ChatHistory, question: &str) -> Result<String> {
        let provider = self
            .availability
            .get(id)
            .ok_or_else(|| CharlaError::UnknownProvider(id.to_string()))?;
        let credential = self
            .availability
            .credential(provider)
            .ok_or_else(|| CharlaError::MissingCredential(id.to_string()))?;

        let messages =
            self.persona
                .conversation(&provider.shape, history, self.config.history_window, question);
        let request = build_request(provider, credential, &messages)?;

        info!(
            provider = id,
            model = %provider.model,
            shape = provider.shape.tag(),
            "sending request"
        );
        let start = Instant::now();
        let result = match self.transport.send(&request).await {
            Ok(response) => normalize(&provider.shape, &response),
            Err(e) => Err(e),
        };
        let elapsed = start.elapsed();

        let status = match &result {
            Ok(answer) => {
                info!(
                    provider = id,
                    chars = answer.chars().count(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "provider answered"
                );
                "ok"
            }
            Err(e) => {
                let kind = e.failure_kind().as_str();
                warn!(provider = id, kind, error = %e, "provider attempt failed");
                kind
            }
        };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => id.to_owned(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => id.to_owned(),
        )
        .record(elapsed.as_secs_f64());

        result
    }
}

fn finish(turn: Turn) -> Turn {
    metrics::counter!(telemetry::TURNS_TOTAL, "outcome" => turn.outcome.label()).increment(1);
    info!(
        outcome = turn.outcome.label(),
        attempts = turn.attempts,
        provider = turn.provider.as_deref(),
        "turn finished"
    );
    turn
}
