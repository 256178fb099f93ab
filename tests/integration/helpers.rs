//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Duration;

use gch_auth::provider::{AdminProfileStore, MemoryAdminProfileStore, MemoryIdentityProvider};
use gch_auth::{CacheInvalidator, SessionCoordinator, StalenessDetector};
use gch_cache::memory::{MemoryKeyValueStore, MemoryResponseCache};
use gch_cache::probe::StorageProbe;
use gch_core::config::cache::ResponseCacheConfig;
use gch_core::traits::page::HeadlessPage;
use gch_core::traits::response_cache::ResponseCache;
use gch_entity::admin::{AdminRole, NewAdminProfile};
use gch_entity::identity::ExternalIdentity;

/// Login route used by every harness.
pub const LOGIN_PATH: &str = "/admin/login";

/// A coordinator over in-memory collaborators, with handles on each part.
pub struct TestHarness {
    pub coordinator: Arc<SessionCoordinator>,
    pub provider: Arc<MemoryIdentityProvider>,
    pub admins: MemoryAdminProfileStore,
    pub persistent: MemoryKeyValueStore,
    pub session: MemoryKeyValueStore,
    pub responses: MemoryResponseCache,
    pub page: Arc<HeadlessPage>,
    pub probe: StorageProbe,
}

impl TestHarness {
    /// One-hour tokens, default staleness window, sitting on the dashboard.
    pub fn new() -> Self {
        Self::build(Duration::hours(1), "/admin")
    }

    /// Tokens issued with `lifetime`.
    pub fn with_token_lifetime(lifetime: Duration) -> Self {
        Self::build(lifetime, "/admin")
    }

    /// Harness whose page sits on `path`.
    pub fn on_page(path: &str) -> Self {
        Self::build(Duration::hours(1), path)
    }

    fn build(lifetime: Duration, path: &str) -> Self {
        let provider = Arc::new(MemoryIdentityProvider::with_token_lifetime(lifetime));
        let admins = MemoryAdminProfileStore::new();
        let persistent = MemoryKeyValueStore::persistent();
        let session = MemoryKeyValueStore::session();
        let responses = MemoryResponseCache::new("test", &ResponseCacheConfig::default());
        let page = Arc::new(HeadlessPage::new(path));

        let probe = StorageProbe::new(Arc::new(persistent.clone()), Arc::new(session.clone()));
        let invalidator = CacheInvalidator::new(
            probe.clone(),
            vec![Arc::new(responses.clone()) as Arc<dyn ResponseCache>],
            page.clone(),
            LOGIN_PATH,
        );
        let coordinator = Arc::new(SessionCoordinator::new(
            provider.clone(),
            Arc::new(admins.clone()),
            probe.clone(),
            invalidator,
            StalenessDetector::default(),
        ));

        Self {
            coordinator,
            provider,
            admins,
            persistent,
            session,
            responses,
            page,
            probe,
        }
    }

    /// Register an account with an active admin profile.
    pub async fn add_admin(&self, email: &str, password: &str) -> ExternalIdentity {
        let user = self.provider.add_account(email, password).await;
        self.admins
            .insert(NewAdminProfile {
                user_id: user.id,
                email: email.to_string(),
                full_name: "Test Admin".to_string(),
                role: AdminRole::Admin,
                is_active: true,
            })
            .await
            .expect("Failed to insert admin profile");
        user
    }

    /// Register an account with no admin profile.
    pub async fn add_user(&self, email: &str, password: &str) -> ExternalIdentity {
        self.provider.add_account(email, password).await
    }

    /// Whether any of the three token keys is still stored.
    pub async fn has_token_keys(&self) -> bool {
        !self
            .probe
            .read_presence()
            .await
            .expect("Failed to read presence")
            .is_absent()
    }
}
