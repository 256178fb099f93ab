//! In-memory key-value store using dashmap.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use gch_core::error::AppError;
use gch_core::result::AppResult;
use gch_core::traits::kv_store::{KeyValueStore, StorageScope};

/// In-process key-value store.
///
/// Stands in for `sessionStorage` (and for `localStorage` in tests). Can be
/// switched to a disabled mode where every call fails, the way storage
/// behaves in some locked-down browser contexts.
#[derive(Debug, Clone)]
pub struct MemoryKeyValueStore {
    /// Scope this store represents.
    scope: StorageScope,
    /// Stored entries.
    entries: Arc<DashMap<String, String>>,
    /// When set, every operation fails.
    disabled: Arc<AtomicBool>,
}

impl MemoryKeyValueStore {
    /// Create an empty store for the given scope.
    pub fn new(scope: StorageScope) -> Self {
        Self {
            scope,
            entries: Arc::new(DashMap::new()),
            disabled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create an empty session-scoped store.
    pub fn session() -> Self {
        Self::new(StorageScope::Session)
    }

    /// Create an empty persistent-scoped store.
    pub fn persistent() -> Self {
        Self::new(StorageScope::Persistent)
    }

    /// Enable or disable access to the store.
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_enabled(&self) -> AppResult<()> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(AppError::storage(format!(
                "{} storage is disabled in this context",
                self.scope
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    fn scope(&self) -> StorageScope {
        self.scope
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.check_enabled()?;
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.check_enabled()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<bool> {
        self.check_enabled()?;
        Ok(self.entries.remove(key).is_some())
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        self.check_enabled()?;
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> AppResult<usize> {
        self.check_enabled()?;
        let count = self.entries.len();
        self.entries.clear();
        debug!(scope = %self.scope, count, "Cleared key-value store");
        Ok(count)
    }
}
