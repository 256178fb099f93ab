//! Key-value storage configuration.

use serde::{Deserialize, Serialize};

/// Settings for the persistent and session-scoped key-value stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Persistent store backend: `"file"` or `"memory"`.
    #[serde(default = "default_backend")]
    pub persistent_backend: String,
    /// JSON file backing the persistent store.
    #[serde(default = "default_persistent_path")]
    pub persistent_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persistent_backend: default_backend(),
            persistent_path: default_persistent_path(),
        }
    }
}

fn default_backend() -> String {
    "file".to_string()
}

fn default_persistent_path() -> String {
    "data/session/local_storage.json".to_string()
}
