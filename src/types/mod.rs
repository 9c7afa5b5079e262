//! Public types for the Charla API.

mod message;
mod outcome;

pub use message::{Message, Role};
pub use outcome::{FailureKind, Outcome, Turn};
