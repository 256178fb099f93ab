//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use gch_core::config::AppConfig;
use gch_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration with secrets masked
    Show,
    /// Validate configuration file
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = masked(super::load_config(config_path)?);
            match format {
                OutputFormat::Table => println!("{config:#?}"),
                OutputFormat::Json => output::print_json(&config),
            }
        }
        ConfigCommand::Validate => match super::load_config(config_path) {
            Ok(config) => {
                output::print_success(&format!("Configuration '{config_path}' is valid"));
                output::print_kv("Supabase", &config.supabase.url);
                output::print_kv("Admin table", &config.supabase.admin_table);
                output::print_kv("Persistent store", &config.storage.persistent_backend);
                output::print_kv(
                    "Staleness window (ms)",
                    &config.session.staleness_window_ms.to_string(),
                );
                output::print_kv(
                    "Recheck every (s)",
                    &config.session.recheck_interval_seconds.to_string(),
                );
                if config.chatbot.webhook_url.is_empty() {
                    output::print_warning("No chatbot webhook configured");
                }
                if config.supabase.url.is_empty() || config.supabase.anon_key.is_empty() {
                    output::print_warning("Supabase url or anon_key is empty");
                }
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e);
            }
        },
    }

    Ok(())
}

/// Replace keys and credentials with a mask.
fn masked(mut config: AppConfig) -> AppConfig {
    config.supabase.anon_key = mask(&config.supabase.anon_key);
    config.supabase.service_role_key = config.supabase.service_role_key.as_deref().map(mask);
    config.supabase.database_url = config.supabase.database_url.as_deref().map(mask_password);
    config
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

/// Mask password in a database URL for display
fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if colon_pos > scheme_end {
                return format!("{}:****{}", &url[..colon_pos], &url[at_pos..]);
            }
        }
    }
    url.to_string()
}
