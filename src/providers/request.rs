//! Request bodies for the two provider wire shapes.

use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;

use super::catalog::{ChatTuning, Provider, RequestShape, TokenLimitField};
use super::headers::json_headers;
use crate::types::{Message, Role};
use crate::{CharlaError, Result};

/// One outbound HTTP call, fully prepared for a [`Transport`](super::Transport).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    /// Query parameters. Kept apart from `url` so the URL can be logged.
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Value,
    pub timeout: Duration,
}

/// Build the request for `provider` carrying `messages`.
pub fn build_request(
    provider: &Provider,
    credential: &str,
    messages: &[Message],
) -> Result<HttpRequest> {
    match &provider.shape {
        RequestShape::ChatCompletions { headers, tuning } => Ok(HttpRequest {
            url: provider.url.clone(),
            query: Vec::new(),
            headers: headers.build(credential)?,
            body: serde_json::to_value(chat_body(provider, tuning, messages))?,
            timeout: provider.timeout,
        }),
        RequestShape::GenerativeContent => {
            if credential.is_empty() {
                return Err(CharlaError::MissingCredential(provider.id.clone()));
            }
            Ok(HttpRequest {
                url: provider.url.clone(),
                query: vec![("key".to_string(), credential.to_string())],
                headers: json_headers(),
                body: serde_json::to_value(generative_body(messages))?,
                timeout: provider.timeout,
            })
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

fn chat_body<'a>(
    provider: &'a Provider,
    tuning: &ChatTuning,
    messages: &'a [Message],
) -> ChatCompletionRequest<'a> {
    let limit = Some(provider.max_output_tokens);
    let (max_tokens, max_completion_tokens) = match tuning.token_limit_field {
        TokenLimitField::MaxTokens => (limit, None),
        TokenLimitField::MaxCompletionTokens => (None, limit),
    };

    ChatCompletionRequest {
        model: &provider.model,
        messages,
        max_tokens,
        max_completion_tokens,
        temperature: tuning.temperature,
        top_p: tuning.top_p,
        presence_penalty: tuning.presence_penalty,
        frequency_penalty: tuning.frequency_penalty,
        seed: tuning.seed,
        stream: tuning.stream,
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Generative-content has no system role: the system prompt goes out as
/// the first user turn and assistant turns are labelled `model`.
fn generative_body(messages: &[Message]) -> GenerateContentRequest<'_> {
    let contents = messages
        .iter()
        .map(|message| Content {
            role: match message.role {
                Role::System | Role::User => "user",
                Role::Assistant => "model",
            },
            parts: [Part {
                text: &message.content,
            }],
        })
        .collect();
    GenerateContentRequest { contents }
}
