//! Chatbot webhook client.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use gch_core::config::chatbot::ChatbotConfig;
use gch_core::error::{AppError, ErrorKind};
use gch_core::result::AppResult;

use crate::reply::extract_reply;
use crate::request::ChatRequest;

/// What the visitor is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub text: String,
    /// Whether `text` is the canned apology.
    pub is_fallback: bool,
}

/// Posts messages to the configured webhook.
#[derive(Debug, Clone)]
pub struct ChatbotClient {
    http: reqwest::Client,
    config: ChatbotConfig,
}

impl ChatbotClient {
    /// Build a client from configuration.
    pub fn new(config: ChatbotConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build chatbot HTTP client", e)
            })?;
        Ok(Self { http, config })
    }

    /// Whether a webhook URL is configured.
    pub fn is_configured(&self) -> bool {
        !self.config.webhook_url.trim().is_empty()
    }

    /// Send a message. Never fails; problems yield the fallback reply.
    pub async fn send(&self, request: ChatRequest) -> ChatReply {
        match self.try_send(request).await {
            Ok(Some(text)) => ChatReply {
                text,
                is_fallback: false,
            },
            Ok(None) => {
                warn!("Chatbot webhook returned no usable reply");
                self.fallback()
            }
            Err(e) => {
                warn!(error = %e, "Chatbot webhook failed");
                self.fallback()
            }
        }
    }

    async fn try_send(&self, mut request: ChatRequest) -> AppResult<Option<String>> {
        if !self.is_configured() {
            return Err(AppError::configuration("chatbot.webhook_url is not set"));
        }
        if request.source.is_empty() {
            request.source = self.config.source.clone();
        }

        debug!(
            attachments = request.attachments.len(),
            projects = request.projects.len(),
            "Posting chatbot message"
        );

        let response = self
            .http
            .post(&self.config.webhook_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() || e.is_connect() {
                    ErrorKind::ServiceUnavailable
                } else {
                    ErrorKind::ExternalService
                };
                AppError::with_source(kind, "Chatbot webhook request failed", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "Chatbot webhook returned {status}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Failed to read chatbot reply", e)
        })?;
        Ok(extract_reply(&body))
    }

    fn fallback(&self) -> ChatReply {
        ChatReply {
            text: self.config.fallback_message.clone(),
            is_fallback: true,
        }
    }
}
