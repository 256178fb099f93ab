//! The `admin_users` table over PostgREST.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, RequestBuilder, Url};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;
use validator::Validate;

use gch_auth::provider::AdminProfileStore;
use gch_cache::keys;
use gch_cache::memory::MemoryResponseCache;
use gch_cache::probe::StorageProbe;
use gch_core::config::supabase::SupabaseConfig;
use gch_core::error::{AppError, ErrorKind};
use gch_core::result::AppResult;
use gch_core::traits::response_cache::ResponseCache;
use gch_entity::admin::{AdminProfile, NewAdminProfile, UpdateAdminProfile};

use crate::client::{self, SupabaseClient};

/// Admin-profile store speaking PostgREST.
///
/// GET responses are cached by URL when a response cache is attached; every
/// write purges the cache. Lookups by user ID always go to the server, since
/// they decide admin authorization. Requests carry the service-role key when one is
/// configured, else the signed-in user's access token, else the anon key.
#[derive(Debug, Clone)]
pub struct RestAdminProfileStore {
    client: SupabaseClient,
    table: String,
    service_key: Option<String>,
    probe: Option<StorageProbe>,
    cache: Option<MemoryResponseCache>,
}

impl RestAdminProfileStore {
    /// Create a store for the configured table.
    pub fn new(client: SupabaseClient, config: &SupabaseConfig) -> Self {
        Self {
            client,
            table: config.admin_table.clone(),
            service_key: config.service_role_key.clone(),
            probe: None,
            cache: None,
        }
    }

    /// Authorize as the signed-in user when no service key is configured.
    pub fn with_probe(mut self, probe: StorageProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Cache GET responses.
    pub fn with_cache(mut self, cache: Option<MemoryResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    async fn bearer(&self) -> String {
        if let Some(key) = &self.service_key {
            return key.clone();
        }
        if let Some(probe) = &self.probe {
            match probe.read_key(keys::ACCESS_TOKEN).await {
                Ok(Some(token)) if !token.is_empty() => return token,
                Ok(_) => {}
                Err(e) => debug!(error = %e, "No user token available, using anon key"),
            }
        }
        self.client.anon_key().to_string()
    }

    fn url(&self, filters: &[(&str, String)]) -> AppResult<Url> {
        let mut url = Url::parse(&self.client.rest_endpoint(&self.table)).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid Supabase URL", e)
        })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            for (column, filter) in filters {
                query.append_pair(column, filter);
            }
        }
        Ok(url)
    }

    async fn select(&self, url: Url) -> AppResult<Vec<AdminProfile>> {
        let cache_key = keys::response("GET", url.as_str());
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(&cache_key).await {
                debug!(url = %url, "Admin profile query served from cache");
                return parse_rows(&body);
            }
        }

        let body = self.fetch(&url).await?;
        let rows = parse_rows(&body)?;

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, body).await;
        }
        Ok(rows)
    }

    async fn fetch(&self, url: &Url) -> AppResult<String> {
        let request = self
            .client
            .request(Method::GET, url.as_str())
            .bearer_auth(self.bearer().await);
        let response = client::check(self.client.send(request).await?).await?;
        response.text().await.map_err(client::transport_error)
    }

    async fn write(&self, method: Method, url: Url, body: Option<Value>) -> AppResult<Vec<AdminProfile>> {
        let mut request = self
            .client
            .request(method, url.as_str())
            .bearer_auth(self.bearer().await)
            .header("Prefer", "return=representation");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let result = self.send_rows(request).await;
        self.purge().await;
        result
    }

    async fn send_rows(&self, request: RequestBuilder) -> AppResult<Vec<AdminProfile>> {
        let response = client::check(self.client.send(request).await?).await?;
        let body = response.text().await.map_err(client::transport_error)?;
        parse_rows(&body)
    }

    async fn purge(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear().await {
                warn!(error = %e, "Failed to purge admin profile cache");
            }
        }
    }
}

fn parse_rows(body: &str) -> AppResult<Vec<AdminProfile>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).map_err(|e| {
        AppError::with_source(
            ErrorKind::Serialization,
            "Unexpected admin_users response",
            e,
        )
    })
}

fn validation_error(err: validator::ValidationErrors) -> AppError {
    AppError::validation(format!("Invalid admin profile: {err}"))
}

#[async_trait]
impl AdminProfileStore for RestAdminProfileStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<AdminProfile>> {
        let url = self.url(&[
            ("user_id", format!("eq.{user_id}")),
            ("limit", "1".to_string()),
        ])?;
        let body = self.fetch(&url).await?;
        Ok(parse_rows(&body)?.into_iter().next())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<AdminProfile>> {
        let url = self.url(&[
            ("email", format!("eq.{}", email.trim())),
            ("limit", "1".to_string()),
        ])?;
        Ok(self.select(url).await?.into_iter().next())
    }

    async fn list(&self) -> AppResult<Vec<AdminProfile>> {
        let url = self.url(&[("order", "created_at.desc".to_string())])?;
        self.select(url).await
    }

    async fn insert(&self, profile: NewAdminProfile) -> AppResult<AdminProfile> {
        profile.validate().map_err(validation_error)?;
        let body = serde_json::to_value(&profile)?;
        self.write(Method::POST, self.url(&[])?, Some(body))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("Insert returned no admin profile"))
    }

    async fn update(&self, id: Uuid, changes: UpdateAdminProfile) -> AppResult<AdminProfile> {
        changes.validate().map_err(validation_error)?;
        if changes.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }

        let mut body = serde_json::to_value(&changes)?;
        if let Value::Object(fields) = &mut body {
            fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);
        }

        self.write(Method::PATCH, self.url(&[("id", format!("eq.{id}"))])?, Some(body))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("Admin profile {id} not found")))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let deleted = self
            .write(Method::DELETE, self.url(&[("id", format!("eq.{id}"))])?, None)
            .await?;
        Ok(!deleted.is_empty())
    }
}
