//! Cache invalidation.
//!
//! Clears every trace of auth state: the token keys and any other auth-scoped
//! keys in the persistent store, the whole session-scoped store, and every
//! registered response cache. Optionally reloads the page when it sits on the
//! login route.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use gch_cache::probe::StorageProbe;
use gch_core::traits::kv_store::KeyValueStore;
use gch_core::traits::page::PageContext;
use gch_core::traits::response_cache::ResponseCache;

/// Whether invalidation may trigger a page reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadPolicy {
    /// Never reload.
    Never,
    /// Reload only when the page context reports the login path.
    IfOnLoginPage,
}

/// What a single invalidation pass removed. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    /// Auth keys removed from the persistent store.
    pub persistent_keys_removed: usize,
    /// Keys cleared from the session-scoped store.
    pub session_keys_cleared: usize,
    /// Entries dropped from response caches.
    pub response_entries_cleared: u64,
    /// Number of storage or cache operations that failed.
    pub failures: usize,
    /// Whether a reload was requested.
    pub reloaded: bool,
}

impl InvalidationReport {
    /// Whether nothing was removed.
    pub fn is_noop(&self) -> bool {
        self.persistent_keys_removed == 0
            && self.session_keys_cleared == 0
            && self.response_entries_cleared == 0
    }
}

/// Removes all auth-related state. Idempotent and infallible.
#[derive(Debug, Clone)]
pub struct CacheInvalidator {
    probe: StorageProbe,
    caches: Vec<Arc<dyn ResponseCache>>,
    page: Arc<dyn PageContext>,
    login_path: String,
}

impl CacheInvalidator {
    /// Create an invalidator over the probe's stores and the given caches.
    pub fn new(
        probe: StorageProbe,
        caches: Vec<Arc<dyn ResponseCache>>,
        page: Arc<dyn PageContext>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            probe,
            caches,
            page,
            login_path: login_path.into(),
        }
    }

    /// The login route that triggers a reload.
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Whether the page context currently sits on the login route.
    pub fn on_login_page(&self) -> bool {
        let path = self.page.current_path();
        path.trim_end_matches('/') == self.login_path.trim_end_matches('/')
    }

    /// Clear every auth key, the session scope and all response caches.
    ///
    /// Storage failures are logged and counted, never returned.
    pub async fn invalidate(&self, policy: ReloadPolicy) -> InvalidationReport {
        let mut report = InvalidationReport::default();

        match self.probe.remove_record().await {
            Ok(removed) => report.persistent_keys_removed += removed,
            Err(e) => {
                warn!(error = %e, "Failed to remove session token keys");
                report.failures += 1;
            }
        }

        // Anything else under the auth namespace, including provider-specific keys.
        match self.probe.auth_keys().await {
            Ok(keys) => {
                for key in keys {
                    match self.probe.persistent().remove(&key).await {
                        Ok(true) => report.persistent_keys_removed += 1,
                        Ok(false) => {}
                        Err(e) => {
                            warn!(key = %key, error = %e, "Failed to remove auth key");
                            report.failures += 1;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to list persistent keys");
                report.failures += 1;
            }
        }

        match self.probe.session().clear().await {
            Ok(cleared) => report.session_keys_cleared = cleared,
            Err(e) => {
                warn!(error = %e, "Failed to clear session-scoped store");
                report.failures += 1;
            }
        }

        for cache in &self.caches {
            match cache.clear().await {
                Ok(cleared) => report.response_entries_cleared += cleared,
                Err(e) => {
                    warn!(cache = %cache.name(), error = %e, "Failed to clear response cache");
                    report.failures += 1;
                }
            }
        }

        if policy == ReloadPolicy::IfOnLoginPage && self.on_login_page() {
            info!(path = %self.login_path, "Reloading login page after cache invalidation");
            self.page.reload();
            report.reloaded = true;
        }

        if report.is_noop() {
            debug!("Cache invalidation found nothing to clear");
        } else {
            info!(
                persistent = report.persistent_keys_removed,
                session = report.session_keys_cleared,
                responses = report.response_entries_cleared,
                failures = report.failures,
                "Auth cache invalidated"
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use gch_cache::keys;
    use gch_cache::memory::{MemoryKeyValueStore, MemoryResponseCache};
    use gch_core::config::cache::ResponseCacheConfig;
    use gch_core::traits::page::HeadlessPage;
    use gch_entity::session::SessionTokenRecord;

    struct Fixture {
        invalidator: CacheInvalidator,
        persistent: MemoryKeyValueStore,
        session: MemoryKeyValueStore,
        responses: MemoryResponseCache,
        page: Arc<HeadlessPage>,
    }

    fn fixture(path: &str) -> Fixture {
        let persistent = MemoryKeyValueStore::persistent();
        let session = MemoryKeyValueStore::session();
        let responses = MemoryResponseCache::new("test", &ResponseCacheConfig::default());
        let page = Arc::new(HeadlessPage::new(path));
        let probe = StorageProbe::new(Arc::new(persistent.clone()), Arc::new(session.clone()));
        let invalidator = CacheInvalidator::new(
            probe,
            vec![Arc::new(responses.clone())],
            page.clone(),
            "/admin/login",
        );
        Fixture {
            invalidator,
            persistent,
            session,
            responses,
            page,
        }
    }

    async fn seed(f: &Fixture) {
        let record = SessionTokenRecord::new("abc", Utc::now() + Duration::hours(1), "ref");
        f.invalidator.probe.write_record(&record).await.unwrap();
        f.persistent
            .set("sb-project-auth-token", "{}")
            .await
            .unwrap();
        f.persistent.set("theme", "dark").await.unwrap();
        f.session.set("admin.tab", "projects").await.unwrap();
        f.responses.insert("GET:/rest/v1/admin_users", "[]").await;
    }

    #[tokio::test]
    async fn test_invalidate_clears_everything_auth_related() {
        let f = fixture("/admin");
        seed(&f).await;

        let report = f.invalidator.invalidate(ReloadPolicy::IfOnLoginPage).await;

        assert_eq!(report.persistent_keys_removed, 4);
        assert_eq!(report.session_keys_cleared, 1);
        assert_eq!(report.response_entries_cleared, 1);
        assert!(!report.reloaded);
        for key in keys::TOKEN_KEYS {
            assert!(f.persistent.get(key).await.unwrap().is_none());
        }
        assert_eq!(f.persistent.get("theme").await.unwrap().as_deref(), Some("dark"));
        assert!(f.session.is_empty());
        assert_eq!(f.responses.len().await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let f = fixture("/admin");
        seed(&f).await;

        f.invalidator.invalidate(ReloadPolicy::Never).await;
        let after_once = f.persistent.keys().await.unwrap();
        let second = f.invalidator.invalidate(ReloadPolicy::Never).await;

        assert!(second.is_noop());
        assert_eq!(f.persistent.keys().await.unwrap(), after_once);
    }

    #[tokio::test]
    async fn test_reload_only_on_login_page() {
        let f = fixture("/admin/login/");
        f.invalidator.invalidate(ReloadPolicy::Never).await;
        assert_eq!(f.page.reload_count(), 0);

        let report = f.invalidator.invalidate(ReloadPolicy::IfOnLoginPage).await;
        assert!(report.reloaded);
        assert_eq!(f.page.reload_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_storage_is_swallowed() {
        let f = fixture("/admin");
        f.persistent.set_disabled(true);
        f.session.set_disabled(true);

        let report = f.invalidator.invalidate(ReloadPolicy::Never).await;
        assert!(report.failures >= 3);
        assert!(report.is_noop());
    }
}
