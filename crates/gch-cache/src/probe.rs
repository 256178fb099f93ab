//! Storage probe over the well-known auth keys.

use std::sync::Arc;

use tracing::debug;

use gch_core::result::AppResult;
use gch_core::traits::kv_store::KeyValueStore;
use gch_entity::session::{RecordPresence, SessionTokenRecord};

use crate::keys;

/// Reads and writes the session token keys in the persistent store and gives
/// access to the session-scoped store. No logic beyond key layout.
#[derive(Debug, Clone)]
pub struct StorageProbe {
    /// `localStorage` equivalent.
    persistent: Arc<dyn KeyValueStore>,
    /// `sessionStorage` equivalent.
    session: Arc<dyn KeyValueStore>,
}

impl StorageProbe {
    /// Create a probe over the two scopes.
    pub fn new(persistent: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self {
            persistent,
            session,
        }
    }

    /// The persistent store.
    pub fn persistent(&self) -> &Arc<dyn KeyValueStore> {
        &self.persistent
    }

    /// The session-scoped store.
    pub fn session(&self) -> &Arc<dyn KeyValueStore> {
        &self.session
    }

    /// Read a single raw key from the persistent store.
    pub async fn read_key(&self, key: &str) -> AppResult<Option<String>> {
        self.persistent.get(key).await
    }

    /// Read the stored token values and classify them.
    pub async fn read_presence(&self) -> AppResult<RecordPresence> {
        let token = self.persistent.get(keys::ACCESS_TOKEN).await?;
        let expires_at = self.persistent.get(keys::EXPIRES_AT).await?;
        let refresh = self.persistent.get(keys::REFRESH_TOKEN).await?;
        Ok(RecordPresence::from_parts(token, expires_at, refresh))
    }

    /// Read the stored record if it is complete.
    pub async fn read_record(&self) -> AppResult<Option<SessionTokenRecord>> {
        Ok(match self.read_presence().await? {
            RecordPresence::Complete(record) => Some(record),
            _ => None,
        })
    }

    /// Mirror a record into the persistent store.
    pub async fn write_record(&self, record: &SessionTokenRecord) -> AppResult<()> {
        self.persistent
            .set(keys::ACCESS_TOKEN, &record.access_token)
            .await?;
        self.persistent
            .set(keys::EXPIRES_AT, &record.expires_at_millis().to_string())
            .await?;
        self.persistent
            .set(keys::REFRESH_TOKEN, &record.refresh_token)
            .await?;
        debug!(expires_at = %record.expires_at, "Mirrored session token record");
        Ok(())
    }

    /// Remove the three token keys. Returns how many existed.
    pub async fn remove_record(&self) -> AppResult<usize> {
        let mut removed = 0;
        for key in keys::TOKEN_KEYS {
            if self.persistent.remove(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Every auth-related key currently in the persistent store.
    pub async fn auth_keys(&self) -> AppResult<Vec<String>> {
        Ok(self
            .persistent
            .keys()
            .await?
            .into_iter()
            .filter(|k| keys::is_auth_key(k))
            .collect())
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::memory::MemoryKeyValueStore;
    use chrono::{TimeZone, Utc};

    fn probe() -> (StorageProbe, MemoryKeyValueStore) {
        let persistent = MemoryKeyValueStore::persistent();
        let probe = StorageProbe::new(
            Arc::new(persistent.clone()),
            Arc::new(MemoryKeyValueStore::session()),
        );
        (probe, persistent)
    }

    #[tokio::test]
    async fn test_write_then_read_record() {
        let (probe, persistent) = probe();
        let expires = Utc.timestamp_millis_opt(1_800_000_000_000).unwrap();
        let record = SessionTokenRecord::new("abc", expires, "ref");
        probe.write_record(&record).await.unwrap();

        assert_eq!(
            persistent.get(keys::EXPIRES_AT).await.unwrap(),
            Some("1800000000000".to_string())
        );
        assert_eq!(probe.read_record().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_partial_record_reads_as_partial() {
        let (probe, persistent) = probe();
        persistent.set(keys::ACCESS_TOKEN, "abc").await.unwrap();
        assert!(matches!(
            probe.read_presence().await.unwrap(),
            RecordPresence::Partial { has_token: true, .. }
        ));
        assert!(probe.read_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_auth_keys_filters_unrelated() {
        let (probe, persistent) = probe();
        persistent.set(keys::ACCESS_TOKEN, "abc").await.unwrap();
        persistent.set("sb-proj-auth-token", "{}").await.unwrap();
        persistent.set("theme", "dark").await.unwrap();
        assert_eq!(
            probe.auth_keys().await.unwrap(),
            vec!["sb-proj-auth-token".to_string(), keys::ACCESS_TOKEN.to_string()]
        );
        assert_eq!(probe.remove_record().await.unwrap(), 1);
    }
}
