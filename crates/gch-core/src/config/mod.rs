//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod cache;
pub mod chatbot;
pub mod logging;
pub mod session;
pub mod storage;
pub mod supabase;

use serde::{Deserialize, Serialize};

pub use self::cache::ResponseCacheConfig;
pub use self::chatbot::ChatbotConfig;
pub use self::logging::LoggingConfig;
pub use self::session::SessionConfig;
pub use self::storage::StorageConfig;
pub use self::supabase::SupabaseConfig;

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "GCH";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hosted BaaS connection settings.
    pub supabase: SupabaseConfig,
    /// Session coordination settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Key-value storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Response cache settings.
    #[serde(default)]
    pub cache: ResponseCacheConfig,
    /// Chatbot webhook settings.
    #[serde(default)]
    pub chatbot: ChatbotConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for a named environment.
    ///
    /// Merges `config/default` with `config/{env}` and environment variables
    /// prefixed with `GCH__` (e.g. `GCH__SUPABASE__URL`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(env_source())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Load configuration from a single file, still honouring `GCH__` overrides.
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(env_source())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml_str(document: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
