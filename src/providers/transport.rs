//! Transport boundary: one HTTP call in, raw status and body out.
//!
//! The dispatch engine talks to providers only through [`Transport`], so
//! tests can script provider behaviour without a network.

use async_trait::async_trait;
use reqwest::Client;

use super::request::HttpRequest;
use crate::{CharlaError, Result};

/// Raw provider response, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one bounded HTTP call.
///
/// Implementations return [`CharlaError::Timeout`], [`CharlaError::Connection`]
/// or [`CharlaError::Http`] for transport-level failures. Any received
/// response, whatever its status, is `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| CharlaError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Use an existing client.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let response = self
            .http
            .post(&request.url)
            .query(&request.query)
            .headers(request.headers.clone())
            .json(&request.body)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(HttpResponse { status, body })
    }
}

/// Map a reqwest error, dropping the URL: it may carry a credential.
fn map_reqwest_error(err: reqwest::Error) -> CharlaError {
    let err = err.without_url();
    if err.is_timeout() {
        CharlaError::Timeout
    } else if err.is_connect() {
        CharlaError::Connection(err.to_string())
    } else {
        CharlaError::Http(err.to_string())
    }
}
