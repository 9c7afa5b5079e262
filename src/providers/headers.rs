//! Header construction for the chat-completions shape.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::{CharlaError, Result};

const OPENROUTER_REFERER: &str = "https://alexa-chatgpt.com";
const OPENROUTER_TITLE: &str = "Alexa ChatGPT Skill";

/// How a provider turns its credential into request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderStrategy {
    /// `Authorization: Bearer <credential>`.
    Bearer,
    /// Bearer auth plus the attribution headers OpenRouter asks for.
    OpenRouter { referer: String, title: String },
}

impl HeaderStrategy {
    /// OpenRouter strategy with the default attribution values.
    pub fn openrouter() -> Self {
        HeaderStrategy::OpenRouter {
            referer: OPENROUTER_REFERER.to_string(),
            title: OPENROUTER_TITLE.to_string(),
        }
    }

    /// Build the header map for one request.
    ///
    /// Fails with `Configuration` if the credential or attribution values
    /// cannot be carried in a header.
    pub fn build(&self, credential: &str) -> Result<HeaderMap> {
        let mut headers = json_headers();
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {credential}"))?);

        if let HeaderStrategy::OpenRouter { referer, title } = self {
            headers.insert(HeaderName::from_static("http-referer"), header_value(referer)?);
            headers.insert(HeaderName::from_static("x-title"), header_value(title)?);
        }

        Ok(headers)
    }
}

/// Headers every JSON request carries.
pub(crate) fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

fn header_value(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|_| CharlaError::Configuration("value is not a valid HTTP header".into()))?;
    value.set_sensitive(true);
    Ok(value)
}
