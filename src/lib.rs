//! Charla - LLM provider routing and fallback for a Spanish voice assistant
//!
//! This crate answers spoken questions by dispatching them to one of many
//! interchangeable LLM backends. It picks a provider per conversation,
//! classifies each failure, falls back to alternate providers on
//! connection-class failures under a bounded budget, and keeps a short
//! conversational memory per session.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use charla::{Availability, Catalog, DispatchEngine, EnvCredentials};
//!
//! #[tokio::main]
//! async fn main() -> charla::Result<()> {
//!     let availability = Availability::resolve(&Catalog::builtin(), &EnvCredentials)?;
//!     let engine = DispatchEngine::builder(Arc::new(availability)).build()?;
//!
//!     let mut session = engine.new_session();
//!     let turn = engine.respond(&mut session, "¿Qué es la fotosíntesis?").await;
//!
//!     println!("{}", turn.text);
//!     Ok(())
//! }
//! ```
//!
//! # Voice adapter
//!
//! [`Assistant`] wraps the engine with a [`SessionStore`] and turns
//! platform requests into [`SpokenReply`] values.

pub mod assistant;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod prompt;
pub mod providers;
pub mod session;
pub mod telemetry;
pub mod types;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types at crate root
pub use assistant::{Assistant, AssistantRequest, SpokenReply};
pub use config::{Config, Secrets};
pub use dispatch::{
    DispatchConfig, DispatchEngine, DispatchEngineBuilder, GENERIC_APOLOGY, Picker, RandomPicker,
    SeededPicker, UNAVAILABLE_APOLOGY,
};
pub use error::{CharlaError, Result};
pub use prompt::Persona;
pub use providers::{
    Availability, Catalog, CredentialSource, EnvCredentials, HttpRequest, HttpResponse, Provider,
    ReqwestTransport, RequestShape, Transport,
};
pub use session::{
    ChatHistory, Exchange, HISTORY_CAPACITY, MemorySessionStore, SessionRecord, SessionState,
    SessionStore, StoreConfig,
};

// Re-export all types
pub use types::{FailureKind, Message, Outcome, Role, Turn};
