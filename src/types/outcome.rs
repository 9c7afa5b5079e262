//! Turn outcome types

use serde::{Deserialize, Serialize};

/// Failure taxonomy governing whether automatic fallback applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Timeout, network failure, HTTP 5xx, empty model output.
    Connection,
    /// HTTP 4xx, undecodable body, missing field, unconfigured credential.
    Other,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Connection => "connection",
            FailureKind::Other => "other",
        }
    }
}

/// Outcome of one dispatched turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(FailureKind),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Label used for logs and metrics: "ok", "connection" or "other".
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "ok",
            Outcome::Failure(kind) => kind.as_str(),
        }
    }
}

/// Result of [`DispatchEngine::respond`](crate::DispatchEngine::respond).
///
/// `text` is always speakable: the cleaned answer on success, a fixed
/// apology otherwise. The raw failure description is kept in `diagnostic`
/// for logs and is never meant to be read to the user.
#[derive(Debug, Clone)]
pub struct Turn {
    pub text: String,
    pub outcome: Outcome,
    /// Provider that produced the final outcome, if any attempt was made.
    pub provider: Option<String>,
    /// Number of provider attempts made for this turn.
    pub attempts: usize,
    pub diagnostic: Option<String>,
}

impl Turn {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}
