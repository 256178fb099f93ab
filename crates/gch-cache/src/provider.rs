//! Storage manager that builds the configured stores.

use std::sync::Arc;

use tracing::info;

use gch_core::config::cache::ResponseCacheConfig;
use gch_core::config::storage::StorageConfig;
use gch_core::error::AppError;
use gch_core::result::AppResult;
use gch_core::traits::kv_store::KeyValueStore;
use gch_core::traits::response_cache::ResponseCache;

use crate::probe::StorageProbe;

/// Owns the persistent store, the session-scoped store and the response
/// cache, selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct StorageManager {
    /// Persistent store.
    persistent: Arc<dyn KeyValueStore>,
    /// Session-scoped store.
    session: Arc<dyn KeyValueStore>,
    /// Response cache for collaborator GET requests.
    #[cfg(feature = "memory")]
    responses: Option<crate::memory::MemoryResponseCache>,
}

impl StorageManager {
    /// Create the stores from configuration.
    pub async fn new(storage: &StorageConfig, cache: &ResponseCacheConfig) -> AppResult<Self> {
        let persistent: Arc<dyn KeyValueStore> = match storage.persistent_backend.as_str() {
            #[cfg(feature = "file")]
            "file" => {
                info!(path = %storage.persistent_path, "Initializing file-backed persistent store");
                Arc::new(crate::file::FileKeyValueStore::open(&storage.persistent_path).await?)
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory persistent store");
                Arc::new(crate::memory::MemoryKeyValueStore::persistent())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown persistent store backend: '{other}'. Supported: file, memory"
                )));
            }
        };

        Ok(Self {
            persistent,
            session: Self::session_store()?,
            #[cfg(feature = "memory")]
            responses: cache
                .enabled
                .then(|| crate::memory::MemoryResponseCache::new("collaborator", cache)),
        })
    }

    /// Create a manager from existing stores (for testing).
    pub fn from_stores(
        persistent: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            persistent,
            session,
            #[cfg(feature = "memory")]
            responses: None,
        }
    }

    #[cfg(feature = "memory")]
    fn session_store() -> AppResult<Arc<dyn KeyValueStore>> {
        Ok(Arc::new(crate::memory::MemoryKeyValueStore::session()))
    }

    #[cfg(not(feature = "memory"))]
    fn session_store() -> AppResult<Arc<dyn KeyValueStore>> {
        Err(AppError::configuration(
            "The session-scoped store requires the `memory` feature",
        ))
    }

    /// A probe over both stores.
    pub fn probe(&self) -> StorageProbe {
        StorageProbe::new(self.persistent.clone(), self.session.clone())
    }

    /// The shared response cache, if enabled.
    #[cfg(feature = "memory")]
    pub fn response_cache(&self) -> Option<crate::memory::MemoryResponseCache> {
        self.responses.clone()
    }

    /// Response caches that invalidation must clear.
    pub fn response_caches(&self) -> Vec<Arc<dyn ResponseCache>> {
        #[allow(unused_mut)]
        let mut caches: Vec<Arc<dyn ResponseCache>> = Vec::new();
        #[cfg(feature = "memory")]
        {
            if let Some(cache) = &self.responses {
                caches.push(Arc::new(cache.clone()));
            }
        }
        caches
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend() {
        let storage = StorageConfig {
            persistent_backend: "memory".to_string(),
            persistent_path: String::new(),
        };
        let manager = StorageManager::new(&storage, &ResponseCacheConfig::default())
            .await
            .unwrap();
        assert_eq!(manager.response_caches().len(), 1);
        assert!(manager.probe().read_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_backend_is_rejected() {
        let storage = StorageConfig {
            persistent_backend: "indexeddb".to_string(),
            persistent_path: String::new(),
        };
        let result = StorageManager::new(&storage, &ResponseCacheConfig::default()).await;
        assert!(result.is_err());
    }
}
