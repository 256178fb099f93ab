//! Point-in-time report of the auth cache.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gch_cache::keys;
use gch_cache::probe::StorageProbe;
use gch_core::traits::kv_store::KeyValueStore;
use gch_entity::session::SessionTokenRecord;

use crate::error::AuthError;
use crate::session::SessionState;
use crate::staleness::StalenessDetector;

/// Presence of one auth key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPresence {
    /// Storage key.
    pub key: String,
    /// Whether a non-empty value is stored.
    pub present: bool,
}

/// Snapshot of the persisted auth state and the coordinator's view of it.
#[derive(Debug, Clone, Serialize)]
pub struct CacheDiagnostics {
    pub captured_at: DateTime<Utc>,
    /// The three token keys, in storage order.
    pub token_keys: Vec<KeyPresence>,
    /// Other auth-namespaced keys found in the persistent store.
    pub other_auth_keys: Vec<String>,
    /// Number of keys in the session-scoped store.
    pub session_keys: usize,
    /// Parsed expiry, when stored and parseable.
    pub expires_at: Option<DateTime<Utc>>,
    /// Seconds until expiry; negative once expired.
    pub expires_in_seconds: Option<i64>,
    pub stale: bool,
    /// Coordinator state name.
    pub state: String,
    pub signed_in_as: Option<String>,
    pub last_error: Option<String>,
    pub stale_evictions: u64,
    /// Storage failures hit while collecting.
    pub storage_errors: Vec<String>,
}

impl CacheDiagnostics {
    /// Read the stores and compute the staleness verdict at `now`.
    ///
    /// Never fails; unreadable storage is listed in `storage_errors`.
    pub async fn collect(
        probe: &StorageProbe,
        detector: &StalenessDetector,
        now: DateTime<Utc>,
    ) -> Self {
        let mut storage_errors = Vec::new();
        let mut token_keys = Vec::with_capacity(keys::TOKEN_KEYS.len());
        let mut expires_at = None;

        for key in keys::TOKEN_KEYS {
            let value = match probe.read_key(key).await {
                Ok(value) => value.filter(|v| !v.is_empty()),
                Err(e) => {
                    storage_errors.push(e.to_string());
                    None
                }
            };
            if key == keys::EXPIRES_AT {
                expires_at = value.as_deref().and_then(SessionTokenRecord::parse_expiry);
            }
            token_keys.push(KeyPresence {
                key: key.to_string(),
                present: value.is_some(),
            });
        }

        // Read failures are already listed from the key loop above.
        let stale = probe
            .read_presence()
            .await
            .map_or(true, |presence| detector.is_presence_stale(&presence, now));

        let other_auth_keys = match probe.auth_keys().await {
            Ok(found) => found
                .into_iter()
                .filter(|k| !keys::TOKEN_KEYS.contains(&k.as_str()))
                .collect(),
            Err(e) => {
                storage_errors.push(e.to_string());
                Vec::new()
            }
        };

        let session_keys = match probe.session().keys().await {
            Ok(found) => found.len(),
            Err(e) => {
                storage_errors.push(e.to_string());
                0
            }
        };

        Self {
            captured_at: now,
            token_keys,
            other_auth_keys,
            session_keys,
            expires_at,
            expires_in_seconds: expires_at.map(|at| (at - now).num_seconds()),
            stale,
            state: SessionState::Unresolved.name().to_string(),
            signed_in_as: None,
            last_error: None,
            stale_evictions: 0,
            storage_errors,
        }
    }

    /// Attach the coordinator's state.
    pub fn with_session(
        mut self,
        state: &SessionState,
        last_error: Option<&AuthError>,
        stale_evictions: u64,
    ) -> Self {
        self.state = state.name().to_string();
        self.signed_in_as = state.identity().and_then(|i| i.email.clone());
        self.last_error = last_error.map(ToString::to_string);
        self.stale_evictions = stale_evictions;
        self
    }

    /// Whether nothing auth-related is stored.
    pub fn is_empty(&self) -> bool {
        self.token_keys.iter().all(|k| !k.present) && self.other_auth_keys.is_empty()
    }

    /// One-word health verdict: `empty`, `stale` or `healthy`.
    pub fn verdict(&self) -> &'static str {
        if self.is_empty() {
            "empty"
        } else if self.stale {
            "stale"
        } else {
            "healthy"
        }
    }
}
