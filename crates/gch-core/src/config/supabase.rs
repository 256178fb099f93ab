//! Hosted BaaS connection configuration.

use serde::{Deserialize, Serialize};

/// Connection settings for the Supabase project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anon API key sent as `apikey` on every request.
    pub anon_key: String,
    /// Service-role key for administrative profile writes (optional).
    #[serde(default)]
    pub service_role_key: Option<String>,
    /// Table holding admin profiles.
    #[serde(default = "default_admin_table")]
    pub admin_table: String,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// Direct Postgres URL, used by the `postgres` admin store backend.
    #[serde(default)]
    pub database_url: Option<String>,
}

impl SupabaseConfig {
    /// The key used for admin-profile writes: service role if configured, else anon.
    pub fn write_key(&self) -> &str {
        self.service_role_key.as_deref().unwrap_or(&self.anon_key)
    }
}

fn default_admin_table() -> String {
    "admin_users".to_string()
}

fn default_timeout() -> u64 {
    15
}
