//! Static catalog of provider descriptors.
//!
//! A [`Provider`] is an immutable description of one backend endpoint: where
//! to send the request, which model to ask for, which credential it needs and
//! which wire shape it speaks. The [`Catalog`] is built once at process start
//! and never mutated; availability filtering happens in
//! [`Availability`](super::Availability).

use std::time::Duration;

use super::headers::HeaderStrategy;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const CEREBRAS_URL: &str = "https://api.cerebras.ai/v1/chat/completions";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default cap on generated tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Which request field carries the output token limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenLimitField {
    #[default]
    MaxTokens,
    MaxCompletionTokens,
}

/// Sampling parameters for the chat-completions shape.
///
/// Unset optional fields are left out of the request body entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTuning {
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub seed: Option<u64>,
    pub stream: Option<bool>,
    pub token_limit_field: TokenLimitField,
}

impl Default for ChatTuning {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_p: None,
            presence_penalty: None,
            frequency_penalty: None,
            seed: None,
            stream: None,
            token_limit_field: TokenLimitField::MaxTokens,
        }
    }
}

impl ChatTuning {
    /// OpenAI direct.
    pub fn openai() -> Self {
        Self {
            presence_penalty: Some(0.2),
            frequency_penalty: Some(0.2),
            ..Self::default()
        }
    }

    /// GitHub Models inference.
    pub fn github() -> Self {
        Self {
            top_p: Some(0.9),
            ..Self::default()
        }
    }

    /// Models routed through OpenRouter.
    pub fn openrouter() -> Self {
        Self {
            top_p: Some(0.9),
            presence_penalty: Some(0.1),
            frequency_penalty: Some(0.1),
            ..Self::default()
        }
    }

    /// Cerebras inference. No penalties, limit sent as `max_completion_tokens`.
    pub fn cerebras() -> Self {
        Self {
            top_p: Some(1.0),
            seed: Some(0),
            stream: Some(false),
            token_limit_field: TokenLimitField::MaxCompletionTokens,
            ..Self::default()
        }
    }
}

/// Request wire shape, together with the settings only that shape uses.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestShape {
    /// OpenAI-style `choices[0].message.content`. Credential in headers.
    ChatCompletions {
        headers: HeaderStrategy,
        tuning: ChatTuning,
    },
    /// Gemini-style `candidates[0].content.parts`. Credential in the query string.
    GenerativeContent,
}

impl RequestShape {
    /// Short tag for logs: `chat-completions` or `generative-content`.
    pub fn tag(&self) -> &'static str {
        match self {
            RequestShape::ChatCompletions { .. } => "chat-completions",
            RequestShape::GenerativeContent => "generative-content",
        }
    }
}

/// Immutable descriptor of one backend LLM endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    pub id: String,
    pub url: String,
    pub model: String,
    /// Name of the credential this provider authenticates with.
    pub credential: String,
    pub shape: RequestShape,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl Provider {
    /// A chat-completions provider with bearer auth and default tuning.
    pub fn chat_completions(
        id: impl Into<String>,
        url: impl Into<String>,
        model: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            model: model.into(),
            credential: credential.into(),
            shape: RequestShape::ChatCompletions {
                headers: HeaderStrategy::Bearer,
                tuning: ChatTuning::default(),
            },
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A generative-content provider.
    pub fn generative_content(
        id: impl Into<String>,
        url: impl Into<String>,
        model: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            model: model.into(),
            credential: credential.into(),
            shape: RequestShape::GenerativeContent,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the header strategy. No effect on generative-content providers.
    pub fn with_headers(mut self, strategy: HeaderStrategy) -> Self {
        if let RequestShape::ChatCompletions { headers, .. } = &mut self.shape {
            *headers = strategy;
        }
        self
    }

    /// Replace the sampling parameters. No effect on generative-content providers.
    pub fn with_tuning(mut self, value: ChatTuning) -> Self {
        if let RequestShape::ChatCompletions { tuning, .. } = &mut self.shape {
            *tuning = value;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }
}

/// Ordered, immutable set of provider descriptors.
///
/// Order is significant: it fixes the order of the availability set and
/// therefore what an index-based picker sees.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    providers: Vec<Provider>,
}

impl Catalog {
    /// Build a catalog from explicit descriptors.
    pub fn new(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    /// The built-in catalog of hosted providers.
    pub fn builtin() -> Self {
        let mut providers = vec![
            Provider::chat_completions(
                "openai",
                "https://api.openai.com/v1/chat/completions",
                "gpt-4.1-mini",
                "OPENAI_API_KEY",
            )
            .with_tuning(ChatTuning::openai()),
            Provider::chat_completions(
                "github",
                "https://models.github.ai/inference/chat/completions",
                "openai/gpt-4.1-mini",
                "GITHUB_TOKEN",
            )
            .with_tuning(ChatTuning::github()),
        ];

        providers.extend(
            [
                ("openrouter", "meta-llama/llama-4-maverick"),
                (
                    "deepseek_r1_distill_llama_70b",
                    "deepseek/deepseek-r1-distill-llama-70b:free",
                ),
                ("deepseek_r1", "deepseek/deepseek-r1"),
                ("deepseek_r1_free", "deepseek/deepseek-r1:free"),
                ("deepseek_chimera", "tngtech/deepseek-r1t-chimera:free"),
                ("qwen3_235b_free", "qwen/qwen3-235b-a22b:free"),
                ("qwen3_235b", "qwen/qwen3-235b-a22b"),
                ("microsoft_mai", "microsoft/mai-ds-r1:free"),
                ("llama_maverick", "meta-llama/llama-4-maverick:free"),
                ("qwen_qwq_free", "qwen/qwq-32b:free"),
                ("qwen_qwq", "qwen/qwq-32b"),
                ("deepseek_chat_v3", "deepseek/deepseek-chat-v3-0324"),
                ("deepseek_chat_v3_free", "deepseek/deepseek-chat-v3-0324:free"),
                ("openai_gpt41_mini", "openai/gpt-4.1-mini"),
                ("google_gemini_20", "google/gemini-2.0-flash-001"),
                ("google_gemini_25", "google/gemini-2.5-flash-preview-05-20"),
            ]
            .into_iter()
            .map(|(id, model)| {
                Provider::chat_completions(id, OPENROUTER_URL, model, "OPENROUTER_API_KEY")
                    .with_headers(HeaderStrategy::openrouter())
                    .with_tuning(ChatTuning::openrouter())
                    .with_timeout(Duration::from_secs(10))
            }),
        );

        providers.extend(
            [
                ("gemini_20", "gemini-2.0-flash"),
                ("gemini_25", "gemini-2.5-flash-preview-05-20"),
            ]
            .into_iter()
            .map(|(id, model)| {
                Provider::generative_content(
                    id,
                    format!("{GEMINI_BASE_URL}/{model}:generateContent"),
                    model,
                    "GEMINI_API_KEY",
                )
                .with_timeout(Duration::from_secs(10))
            }),
        );

        providers.extend(
            [
                ("cerebras", "llama-4-scout-17b-16e-instruct"),
                ("cerebras_llama4_scout", "llama-4-scout-17b-16e-instruct"),
                ("cerebras_llama33_70b", "llama-3.3-70b"),
                ("cerebras_qwen3_32b", "qwen-3-32b"),
                (
                    "cerebras_deepseek_r1_distill_llama_70b",
                    "deepseek-r1-distill-llama-70b",
                ),
            ]
            .into_iter()
            .map(|(id, model)| {
                Provider::chat_completions(id, CEREBRAS_URL, model, "CEREBRAS_API_KEY")
                    .with_tuning(ChatTuning::cerebras())
                    .with_timeout(Duration::from_secs(10))
            }),
        );

        Self { providers }
    }

    /// Look up a provider by id.
    pub fn get(&self, id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
