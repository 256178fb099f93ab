//! Shared HTTP client for the Supabase REST surfaces.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use gch_core::config::supabase::SupabaseConfig;
use gch_core::error::{AppError, ErrorKind};
use gch_core::result::AppResult;

/// Error body shapes returned by GoTrue and PostgREST.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .or(self.details)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Base URL, API key and a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Build a client from configuration.
    pub fn new(config: &SupabaseConfig) -> AppResult<Self> {
        if config.url.trim().is_empty() {
            return Err(AppError::configuration("supabase.url must not be empty"));
        }
        if config.anon_key.trim().is_empty() {
            return Err(AppError::configuration("supabase.anon_key must not be empty"));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("gch-backoffice/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;

        Ok(Self::with_http_client(http, &config.url, &config.anon_key))
    }

    /// Use an existing `reqwest` client.
    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl AsRef<str>,
        anon_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Project base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The anon API key.
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// `{base}/auth/v1/{path}`.
    pub fn auth_endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `{base}/rest/v1/{table}`.
    pub fn rest_endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.trim_start_matches('/'))
    }

    /// Start a request carrying the `apikey` header.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
    }

    /// Send a request, mapping transport failures.
    pub async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        request.send().await.map_err(transport_error)
    }
}

/// Map a `reqwest` transport failure.
pub fn transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() || err.is_connect() {
        AppError::with_source(
            ErrorKind::ServiceUnavailable,
            "Supabase is unreachable",
            err,
        )
    } else if err.is_decode() {
        AppError::with_source(
            ErrorKind::Serialization,
            "Unexpected response from Supabase",
            err,
        )
    } else {
        AppError::with_source(ErrorKind::ExternalService, "Supabase request failed", err)
    }
}

/// The error kind for a non-success status.
pub fn status_kind(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::Validation,
        StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
        StatusCode::FORBIDDEN => ErrorKind::Authorization,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::Conflict,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            ErrorKind::ServiceUnavailable
        }
        _ => ErrorKind::ExternalService,
    }
}

/// Turn a non-success response into an [`AppError`] carrying the server's
/// own message when it sent one.
pub async fn error_from_response(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            format!(
                "Supabase returned {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )
        });

    debug!(status = status.as_u16(), message = %message, "Supabase request rejected");
    AppError::new(status_kind(status), message)
}

/// Return the response if successful, else its mapped error.
pub async fn check(response: Response) -> AppResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::with_http_client(reqwest::Client::new(), "https://xyz.supabase.co/", "anon")
    }

    #[test]
    fn test_endpoints() {
        let client = client();
        assert_eq!(
            client.auth_endpoint("token?grant_type=password"),
            "https://xyz.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            client.rest_endpoint("admin_users"),
            "https://xyz.supabase.co/rest/v1/admin_users"
        );
    }

    #[test]
    fn test_status_kinds() {
        assert_eq!(status_kind(StatusCode::BAD_REQUEST), ErrorKind::Validation);
        assert_eq!(status_kind(StatusCode::UNAUTHORIZED), ErrorKind::Authentication);
        assert_eq!(status_kind(StatusCode::CONFLICT), ErrorKind::Conflict);
        assert_eq!(
            status_kind(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorKind::ExternalService
        );
    }

    #[test]
    fn test_error_body_message_priority() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));

        let body: ErrorBody =
            serde_json::from_str(r#"{"code":400,"msg":"Email not confirmed"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Email not confirmed"));
    }

    #[test]
    fn test_empty_config_is_rejected() {
        let config = SupabaseConfig {
            url: String::new(),
            anon_key: "anon".to_string(),
            service_role_key: None,
            admin_table: "admin_users".to_string(),
            request_timeout_seconds: 5,
            database_url: None,
        };
        assert!(SupabaseClient::new(&config).is_err());
    }
}
