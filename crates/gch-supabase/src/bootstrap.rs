//! Wiring of the stores, collaborators and coordinator from configuration.

use std::sync::Arc;

use tracing::info;

use gch_auth::provider::{AdminProfileStore, IdentityProvider};
use gch_auth::SessionCoordinator;
use gch_cache::provider::StorageManager;
use gch_core::config::AppConfig;
use gch_core::result::AppResult;
use gch_core::traits::page::PageContext;

use crate::auth::GoTrueIdentityProvider;
use crate::client::SupabaseClient;
use crate::rest::RestAdminProfileStore;

/// Everything a host needs to run the back-office session layer.
#[derive(Debug, Clone)]
pub struct Backoffice {
    /// Persistent and session-scoped stores.
    pub storage: StorageManager,
    /// Identity collaborator.
    pub identity: Arc<GoTrueIdentityProvider>,
    /// Admin-profile store.
    pub admin_store: Arc<dyn AdminProfileStore>,
    /// The session coordinator.
    pub coordinator: Arc<SessionCoordinator>,
}

impl Backoffice {
    /// Build every component from `config`, sitting on `page`.
    pub async fn connect(config: &AppConfig, page: Arc<dyn PageContext>) -> AppResult<Self> {
        let storage = StorageManager::new(&config.storage, &config.cache).await?;
        let client = SupabaseClient::new(&config.supabase)?;

        let identity =
            Arc::new(GoTrueIdentityProvider::new(client.clone()).with_probe(storage.probe()));
        let admin_store = admin_store(config, client, &storage).await?;

        let coordinator = Arc::new(SessionCoordinator::with_storage(
            identity.clone() as Arc<dyn IdentityProvider>,
            admin_store.clone(),
            &storage,
            page,
            &config.session,
        ));

        info!(
            supabase = %config.supabase.url,
            persistent_backend = %config.storage.persistent_backend,
            "Back-office session layer initialized"
        );

        Ok(Self {
            storage,
            identity,
            admin_store,
            coordinator,
        })
    }
}

#[cfg(feature = "postgres")]
async fn admin_store(
    config: &AppConfig,
    client: SupabaseClient,
    storage: &StorageManager,
) -> AppResult<Arc<dyn AdminProfileStore>> {
    if let Some(url) = config.supabase.database_url.as_deref().filter(|u| !u.is_empty()) {
        info!("Using Postgres admin profile store");
        let store = crate::postgres::PgAdminProfileStore::connect(url, &config.supabase.admin_table)
            .await?;
        return Ok(Arc::new(store));
    }
    Ok(rest_store(config, client, storage))
}

#[cfg(not(feature = "postgres"))]
async fn admin_store(
    config: &AppConfig,
    client: SupabaseClient,
    storage: &StorageManager,
) -> AppResult<Arc<dyn AdminProfileStore>> {
    if config.supabase.database_url.is_some() {
        tracing::warn!("database_url is set but the `postgres` feature is disabled; using REST");
    }
    Ok(rest_store(config, client, storage))
}

fn rest_store(
    config: &AppConfig,
    client: SupabaseClient,
    storage: &StorageManager,
) -> Arc<dyn AdminProfileStore> {
    Arc::new(
        RestAdminProfileStore::new(client, &config.supabase)
            .with_probe(storage.probe())
            .with_cache(storage.response_cache()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gch_core::traits::page::HeadlessPage;

    fn config(url: &str) -> AppConfig {
        AppConfig::from_toml_str(&format!(
            r#"
            [supabase]
            url = "{url}"
            anon_key = "anon"

            [storage]
            persistent_backend = "memory"
            "#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_connect_starts_unresolved() {
        let backoffice = Backoffice::connect(
            &config("https://example.supabase.co"),
            Arc::new(HeadlessPage::default()),
        )
        .await
        .unwrap();

        assert!(!backoffice.coordinator.state().is_resolved());
        assert_eq!(backoffice.storage.response_caches().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_missing_url() {
        let result = Backoffice::connect(&config(""), Arc::new(HeadlessPage::default())).await;
        assert!(result.is_err());
    }
}
