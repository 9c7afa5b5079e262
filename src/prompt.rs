//! System prompt and conversation assembly.
//!
//! Prompt wording is configuration: [`Persona`] holds one template per wire
//! shape with `{country}` and `{tone}` placeholders.

use serde::Deserialize;

use crate::providers::RequestShape;
use crate::session::ChatHistory;
use crate::types::Message;

const DEFAULT_CHAT_PROMPT: &str = "\
Eres un asistente de inteligencia artificial con un toque latino {tone}, especializado en responder de manera clara, concisa y amigable, ideal para una conversación por voz.

REGLAS CLAVE PARA RESPONDER:
- Habla siempre en español latino {tone}, con un tono amable y cercano.
- Tus respuestas deben ser como una charla fluida: naturales, conversacionales y fáciles de entender al escucharlas.
- Sé breve y al grano: idealmente no más de 120-180 palabras, para que sea fácil seguirte la conversación solo con audio.
- Cuando sea apropiado y encaje de forma natural, incluye ejemplos o referencias culturales de {country}.
- Si no tienes la respuesta a algo, admítelo con sinceridad. Es mejor ser honesto.
- Explica las cosas de forma sencilla, evitando términos muy técnicos, para que todos te puedan entender.

Tu misión es ser un parcero conversador y útil: que la gente en {country} disfrute charlar contigo y encuentre valor en tus respuestas.";

const DEFAULT_GENERATIVE_PROMPT: &str = "\
Eres un asistente de inteligencia artificial especializado en responder en español de manera clara y concisa para personas de {country}.

REGLAS IMPORTANTES:
- Responde SIEMPRE en español, sin importar el idioma de la pregunta
- Sé conversacional, amigable y natural como si fueras un amigo conocedor con un toque {tone}
- Máximo 150 palabras por respuesta para mantener la atención
- Usa ejemplos y referencias culturales de {country} cuando sea relevante
- Si no sabes algo, admítelo honestamente
- Evita jerga técnica excesiva, explica de forma simple

Tu objetivo es ser útil, informativo y entretenido para usuarios de habla hispana de {country}.";

/// Persona settings used to render the system prompt.
///
/// ```toml
/// [persona]
/// country = "México"
/// tone = "mexicano"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    /// Template for chat-completions providers.
    #[serde(default)]
    pub chat_prompt: Option<String>,
    /// Template for generative-content providers.
    #[serde(default)]
    pub generative_prompt: Option<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            country: default_country(),
            tone: default_tone(),
            chat_prompt: None,
            generative_prompt: None,
        }
    }
}

fn default_country() -> String {
    "Colombia".to_string()
}

fn default_tone() -> String {
    "colombiano".to_string()
}

impl Persona {
    /// Render the system prompt for a provider of the given shape.
    pub fn system_prompt(&self, shape: &RequestShape) -> String {
        let template = match shape {
            RequestShape::ChatCompletions { .. } => {
                self.chat_prompt.as_deref().unwrap_or(DEFAULT_CHAT_PROMPT)
            }
            RequestShape::GenerativeContent => self
                .generative_prompt
                .as_deref()
                .unwrap_or(DEFAULT_GENERATIVE_PROMPT),
        };
        template
            .replace("{country}", &self.country)
            .replace("{tone}", &self.tone)
    }

    /// System prompt, the last `window` exchanges, then the new question.
    pub fn conversation(
        &self,
        shape: &RequestShape,
        history: &ChatHistory,
        window: usize,
        question: &str,
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2 + window * 2);
        messages.push(Message::system(self.system_prompt(shape)));
        for exchange in history.recent(window) {
            messages.push(Message::user(exchange.question.as_str()));
            messages.push(Message::assistant(exchange.answer.as_str()));
        }
        messages.push(Message::user(question));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Exchange;
    use crate::types::Role;

    #[test]
    fn default_prompt_mentions_country_and_tone() {
        let persona = Persona::default();
        let prompt = persona.system_prompt(&RequestShape::GenerativeContent);
        assert!(prompt.contains("Colombia"));
        assert!(prompt.contains("colombiano"));
        assert!(!prompt.contains("{country}"));
    }

    #[test]
    fn custom_template_is_rendered() {
        let persona = Persona {
            country: "Chile".into(),
            tone: "chileno".into(),
            chat_prompt: Some("Hola desde {country}, tono {tone}".into()),
            generative_prompt: None,
        };
        let shape = crate::providers::Catalog::builtin().get("openai").unwrap().shape.clone();
        assert_eq!(persona.system_prompt(&shape), "Hola desde Chile, tono chileno");
    }

    #[test]
    fn conversation_uses_history_window() {
        let mut history = ChatHistory::new();
        for i in 0..8 {
            history.push(Exchange::new(format!("q{i}"), format!("a{i}")));
        }
        let messages =
            Persona::default().conversation(&RequestShape::GenerativeContent, &history, 6, "nueva");
        assert_eq!(messages.len(), 1 + 12 + 1);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "q2");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[12].content, "a7");
        assert_eq!(messages[13], Message::user("nueva"));
    }
}
