//! Chatbot webhook configuration.

use serde::{Deserialize, Serialize};

/// Settings for the n8n chatbot webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotConfig {
    /// Webhook URL messages are posted to.
    #[serde(default)]
    pub webhook_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Value sent in the `source` field.
    #[serde(default = "default_source")]
    pub source: String,
    /// Reply shown when the webhook fails or returns nothing usable.
    #[serde(default = "default_fallback")]
    pub fallback_message: String,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            timeout_seconds: default_timeout(),
            source: default_source(),
            fallback_message: default_fallback(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_source() -> String {
    "gch-website-chatbot".to_string()
}

fn default_fallback() -> String {
    "Lo siento, estoy teniendo problemas para responder en este momento. \
     Por favor, inténtalo de nuevo más tarde o contáctanos directamente."
        .to_string()
}
