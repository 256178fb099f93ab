//! In-memory response cache using the moka crate.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use gch_core::config::cache::ResponseCacheConfig;
use gch_core::result::AppResult;
use gch_core::traits::response_cache::ResponseCache;

/// TTL-bounded cache of collaborator response bodies keyed by request.
#[derive(Debug, Clone)]
pub struct MemoryResponseCache {
    /// Name reported in logs.
    name: String,
    /// The underlying moka cache.
    cache: Cache<String, String>,
}

impl MemoryResponseCache {
    /// Create a new response cache from configuration.
    pub fn new(name: impl Into<String>, config: &ResponseCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.time_to_live_seconds))
            .build();

        Self {
            name: name.into(),
            cache,
        }
    }

    /// Get a cached body.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).await
    }

    /// Store a body.
    pub async fn insert(&self, key: impl Into<String>, body: impl Into<String>) {
        self.cache.insert(key.into(), body.into()).await;
    }

    /// Number of cached entries after pending maintenance has run.
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn clear(&self) -> AppResult<u64> {
        self.cache.run_pending_tasks().await;
        let count = self.cache.entry_count();
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        debug!(cache = %self.name, count, "Cleared response cache");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cache() -> MemoryResponseCache {
        let config = ResponseCacheConfig {
            enabled: true,
            max_capacity: 100,
            time_to_live_seconds: 60,
        };
        MemoryResponseCache::new("admin_users", &config)
    }

    #[tokio::test]
    async fn test_insert_get() {
        let cache = make_cache();
        cache.insert("GET:/rest/v1/admin_users", "[]").await;
        assert_eq!(
            cache.get("GET:/rest/v1/admin_users").await,
            Some("[]".to_string())
        );
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let cache = make_cache();
        cache.insert("a", "1").await;
        cache.insert("b", "2").await;
        assert_eq!(cache.clear().await.unwrap(), 2);
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.len().await, 0);
    }
}
