//! Session coordination configuration.

use serde::{Deserialize, Serialize};

/// Session coordination configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Look-ahead window in milliseconds within which a token counts as stale.
    #[serde(default = "default_staleness_window")]
    pub staleness_window_ms: i64,
    /// Period of the scheduled staleness re-check in seconds.
    #[serde(default = "default_recheck_interval")]
    pub recheck_interval_seconds: u64,
    /// Location of the back-office login page.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Whether the coordinator follows the provider's auth-change stream.
    #[serde(default = "default_true")]
    pub follow_auth_events: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            staleness_window_ms: default_staleness_window(),
            recheck_interval_seconds: default_recheck_interval(),
            login_path: default_login_path(),
            follow_auth_events: true,
        }
    }
}

fn default_staleness_window() -> i64 {
    300_000
}

fn default_recheck_interval() -> u64 {
    60
}

fn default_login_path() -> String {
    "/admin/login".to_string()
}

fn default_true() -> bool {
    true
}
