//! Webhook request body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file the visitor attached to the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Public URL of the uploaded file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A published project the bot may reference in its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub attachments: Vec<Attachment>,
    pub timestamp: DateTime<Utc>,
    pub projects: Vec<ProjectContext>,
    pub source: String,
    pub user_agent: String,
    pub ip: String,
}

impl ChatRequest {
    /// A text-only message stamped now. `source` is filled in by the client.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            attachments: Vec::new(),
            timestamp: Utc::now(),
            projects: Vec::new(),
            source: String::new(),
            user_agent: "unknown".to_string(),
            ip: "unknown".to_string(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_projects(mut self, projects: Vec<ProjectContext>) -> Self {
        self.projects = projects;
        self
    }

    /// Record the visitor's user agent and address.
    pub fn with_client(mut self, user_agent: impl Into<String>, ip: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self.ip = ip.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let request = ChatRequest::new("Hola")
            .with_client("Mozilla/5.0", "203.0.113.7")
            .with_attachments(vec![Attachment {
                name: "cocina.jpg".to_string(),
                mime_type: Some("image/jpeg".to_string()),
                size: Some(1024),
                url: None,
            }]);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["message"], "Hola");
        assert_eq!(value["userAgent"], "Mozilla/5.0");
        assert_eq!(value["ip"], "203.0.113.7");
        assert_eq!(value["attachments"][0]["type"], "image/jpeg");
        assert!(value["attachments"][0].get("url").is_none());
        assert!(value["timestamp"].is_string());
        assert!(value["projects"].as_array().unwrap().is_empty());
    }
}
