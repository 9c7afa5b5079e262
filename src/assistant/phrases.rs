//! Everything the assistant says that does not come from a model.

pub const WELCOME: &str = "Hola, soy tu asistente inteligente. ¿En qué puedo ayudarte hoy?";

pub const PLEASE_REPEAT: &str = "No he recibido tu pregunta correctamente. ¿Puedes repetirla?";

pub const HELP: &str = "Soy tu asistente inteligente personal. Puedes preguntarme sobre cualquier tema: \
ciencia, historia, tecnología, cocina, deportes, entretenimiento y mucho más. \
Por ejemplo, puedes decir: 'explícame qué es la inteligencia artificial' o \
'cuéntame sobre la cultura mexicana'. ¿Qué te gustaría saber?";

pub const HELP_REPROMPT: &str = "¿Sobre qué tema te gustaría que conversemos?";

pub const NEW_TOPIC: &str =
    "¡Perfecto! Empecemos con un tema nuevo. ¿Sobre qué te gustaría conversar ahora?";

pub const ASK_TOPIC: &str = "¿Sobre qué tema te gustaría conversar?";

pub const GOODBYE: &str =
    "¡Hasta pronto! Espero haberte sido de ayuda. Puedes volver a preguntarme cuando quieras.";

/// Follow-up prompts after an answer.
pub const REPROMPTS: &[&str] = &[
    "¿Qué más te gustaría saber?",
    "¿Hay algo más que quieras preguntarme?",
    "¿Tienes otra pregunta?",
    "¿En qué más puedo ayudarte?",
    "¿Quieres que te explique algo más?",
    "¿Hay algún otro tema que te interese?",
    "¿Necesitas ayuda con algo más?",
];

/// Spoken (and reprompted) after a connection-class failure.
pub const RETRY_PROMPTS: &[&str] = &[
    "Parece que hubo un problema de conexión. ¿Quieres intentarlo de nuevo?",
    "No pude conectarme al servicio. ¿Quieres que lo intente otra vez?",
    "El modelo no respondió. ¿Deseas que lo intente de nuevo?",
    "Hubo un error temporal. ¿Intento responderte otra vez?",
    "No logré obtener respuesta. ¿Quieres reintentar tu pregunta?",
];
