//! JSON-file key-value store standing in for browser `localStorage`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use gch_core::error::AppError;
use gch_core::result::AppResult;
use gch_core::traits::kv_store::{KeyValueStore, StorageScope};

/// Persistent key-value store kept in a single JSON object file.
///
/// The whole map is held in memory and rewritten on every mutation through
/// a temporary file and rename, so a crash never leaves a torn file.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    /// Backing file.
    path: PathBuf,
    /// Current contents.
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl FileKeyValueStore {
    /// Open the store, loading existing contents if the file exists.
    ///
    /// A corrupt file is logged and treated as empty.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<BTreeMap<String, String>>(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Persistent store is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(AppError::with_source(
                    gch_core::ErrorKind::Storage,
                    format!("Failed to read persistent store '{}'", path.display()),
                    e,
                ));
            }
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened persistent store");

        Ok(Self {
            path,
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let body = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    fn scope(&self) -> StorageScope {
        StorageScope::Persistent
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries).await
    }

    async fn remove(&self, key: &str) -> AppResult<bool> {
        let mut entries = self.entries.lock().await;
        let existed = entries.remove(key).is_some();
        if existed {
            self.flush(&entries).await?;
        }
        Ok(existed)
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.keys().cloned().collect())
    }

    async fn clear(&self) -> AppResult<usize> {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        entries.clear();
        self.flush(&entries).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session/local_storage.json");

        let store = FileKeyValueStore::open(&path).await.unwrap();
        store.set("supabase.auth.token", "abc").await.unwrap();
        store.set("theme", "dark").await.unwrap();
        assert!(store.remove("theme").await.unwrap());

        let reopened = FileKeyValueStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("supabase.auth.token").await.unwrap(),
            Some("abc".to_string())
        );
        assert_eq!(reopened.keys().await.unwrap(), vec!["supabase.auth.token"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = FileKeyValueStore::open(&path).await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());
    }
}
