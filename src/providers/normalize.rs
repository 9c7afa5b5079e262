//! Response normalization: raw provider output to answer text or error.
//!
//! Both wire shapes go through the same steps:
//!
//! 1. non-2xx status → [`CharlaError::Api`] (5xx is connection-class)
//! 2. body decoded as JSON → [`CharlaError::Json`] on failure
//! 3. answer text extracted per shape → [`CharlaError::MalformedResponse`]
//!    when the expected field is missing
//! 4. reasoning blocks removed, text trimmed → [`CharlaError::EmptyResponse`]
//!    when nothing is left

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::catalog::RequestShape;
use super::transport::HttpResponse;
use crate::{CharlaError, Result};

/// Longest slice of a non-JSON error body kept in diagnostics.
const ERROR_SNIPPET_CHARS: usize = 100;

static REASONING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<think>.*?</think>|<thinking>.*?</thinking>|<reasoning>.*?</reasoning>")
        .expect("reasoning pattern is valid")
});

/// Turn a raw response into cleaned answer text.
pub fn normalize(shape: &RequestShape, response: &HttpResponse) -> Result<String> {
    if !response.is_success() {
        return Err(CharlaError::Api {
            status: response.status,
            message: error_message(&response.body),
        });
    }

    let body: Value = serde_json::from_str(&response.body)?;
    let text = match shape {
        RequestShape::ChatCompletions { .. } => chat_completion_text(&body)?,
        RequestShape::GenerativeContent => generative_content_text(&body)?,
    };
    clean_answer(&text)
}

/// Strip reasoning blocks and surrounding whitespace.
///
/// Returns [`CharlaError::EmptyResponse`] if the answer is blank before or
/// after stripping.
pub fn clean_answer(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CharlaError::EmptyResponse);
    }
    let cleaned = strip_reasoning(trimmed);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(CharlaError::EmptyResponse);
    }
    Ok(cleaned.to_string())
}

/// Remove every matched `<think>…</think>` style block, case-insensitive.
pub fn strip_reasoning(text: &str) -> String {
    REASONING_BLOCK.replace_all(text, "").into_owned()
}

fn chat_completion_text(body: &Value) -> Result<String> {
    let Some(choice) = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    else {
        return Err(missing_answer(body, "choices"));
    };

    match choice.get("message").and_then(|m| m.get("content")) {
        Some(Value::String(content)) => Ok(content.clone()),
        // Some reasoning models answer with a null content.
        Some(Value::Null) => Ok(String::new()),
        Some(_) => Err(CharlaError::MalformedResponse(
            "choices[0].message.content is not a string".into(),
        )),
        None => Err(CharlaError::MalformedResponse(
            "choices[0].message.content missing".into(),
        )),
    }
}

fn generative_content_text(body: &Value) -> Result<String> {
    let Some(candidate) = body
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
    else {
        return Err(missing_answer(body, "candidates"));
    };

    let parts = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            CharlaError::MalformedResponse("candidates[0].content.parts missing".into())
        })?;

    let texts: Vec<&str> = parts
        .iter()
        .map(|part| part.get("text").and_then(Value::as_str).unwrap_or_default())
        .collect();
    Ok(texts.join(" "))
}

/// No answer array: an in-band `error` object is a provider failure,
/// anything else is a malformed body.
fn missing_answer(body: &Value, field: &str) -> CharlaError {
    match body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        Some(message) => CharlaError::ProviderReported(message.to_string()),
        None => CharlaError::MalformedResponse(format!("{field} missing or empty")),
    }
}

/// Describe an error body: `error.message` when JSON, else a short prefix.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body)
        && let Some(error) = value.get("error")
    {
        return error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
    }
    body.chars().take(ERROR_SNIPPET_CHARS).collect()
}
