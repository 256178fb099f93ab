//! Key-value store trait mirroring browser `localStorage`/`sessionStorage`.

use std::fmt;

use async_trait::async_trait;

use crate::result::AppResult;

/// Which browser-like storage scope a store stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageScope {
    /// Survives restarts (`localStorage`).
    Persistent,
    /// Lives as long as the process (`sessionStorage`).
    Session,
}

impl fmt::Display for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistent => write!(f, "persistent"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// String key-value store with read/write/delete semantics.
///
/// Implementations may fail (disabled storage, I/O errors); callers that
/// must never fail are expected to swallow and log those errors.
#[async_trait]
pub trait KeyValueStore: Send + Sync + fmt::Debug + 'static {
    /// The scope this store represents.
    fn scope(&self) -> StorageScope;

    /// Get a value by key.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove a key. Returns `true` if it existed.
    async fn remove(&self, key: &str) -> AppResult<bool>;

    /// List all keys currently stored.
    async fn keys(&self) -> AppResult<Vec<String>>;

    /// Remove every key. Returns the number removed.
    async fn clear(&self) -> AppResult<usize>;
}
