//! Charla error types

use crate::types::FailureKind;

/// Charla error types
#[derive(Debug, thiserror::Error)]
pub enum CharlaError {
    // Transport errors
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The model answered, but with nothing worth reading aloud.
    #[error("empty response from model")]
    EmptyResponse,

    /// 2xx body carrying an `error` object instead of an answer.
    #[error("provider reported an error: {0}")]
    ProviderReported(String),

    // Configuration errors
    #[error("credential not configured for provider {0}")]
    MissingCredential(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// No provider has a usable credential. The process cannot serve turns.
    #[error("no provider credentials configured")]
    NoCredentials,
}

impl CharlaError {
    /// Classify this error into the dispatch failure taxonomy.
    ///
    /// Connection-class errors are eligible for fallback to another
    /// provider within the same turn; everything else is surfaced as-is.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            CharlaError::Timeout
            | CharlaError::Connection(_)
            | CharlaError::Http(_)
            | CharlaError::EmptyResponse
            | CharlaError::ProviderReported(_) => FailureKind::Connection,
            CharlaError::Api { status, .. } if *status >= 500 => FailureKind::Connection,
            CharlaError::Api { .. }
            | CharlaError::Json(_)
            | CharlaError::MalformedResponse(_)
            | CharlaError::MissingCredential(_)
            | CharlaError::UnknownProvider(_)
            | CharlaError::Configuration(_)
            | CharlaError::NoCredentials => FailureKind::Other,
        }
    }

    /// Whether this error should trigger provider fallback.
    pub fn is_connection_class(&self) -> bool {
        self.failure_kind() == FailureKind::Connection
    }
}

/// Result type alias for Charla operations
pub type Result<T> = std::result::Result<T, CharlaError>;
