//! Provider catalog, availability, and the wire-level plumbing.
//!
//! - [`catalog`]: static [`Provider`] descriptors
//! - [`availability`]: which providers have usable credentials
//! - [`request`]: request bodies for both wire shapes
//! - [`transport`]: the HTTP boundary
//! - [`normalize`]: raw response to answer text or classified error

pub mod availability;
pub mod catalog;
pub mod headers;
pub mod normalize;
pub mod request;
pub mod transport;

pub use availability::{Availability, CredentialSource, EnvCredentials, is_valid_credential};
pub use catalog::{Catalog, ChatTuning, Provider, RequestShape, TokenLimitField};
pub use headers::HeaderStrategy;
pub use normalize::{clean_answer, normalize, strip_reasoning};
pub use request::{HttpRequest, build_request};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
