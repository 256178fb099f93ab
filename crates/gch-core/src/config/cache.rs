//! Response cache configuration.

use serde::{Deserialize, Serialize};

/// In-memory response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseCacheConfig {
    /// Whether GET responses from the BaaS are cached at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of cached responses.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// TTL for cached responses in seconds.
    #[serde(default = "default_ttl")]
    pub time_to_live_seconds: u64,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: default_max_capacity(),
            time_to_live_seconds: default_ttl(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_capacity() -> u64 {
    1000
}

fn default_ttl() -> u64 {
    30
}
