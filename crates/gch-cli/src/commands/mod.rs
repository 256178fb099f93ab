//! CLI command definitions and dispatch.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod config;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use gch_core::config::AppConfig;
use gch_core::error::AppError;
use gch_core::traits::page::HeadlessPage;
use gch_supabase::Backoffice;

use crate::output::OutputFormat;

/// GCH Servicios back-office session tool
#[derive(Debug, Parser)]
#[command(name = "gch", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in, sign out and inspect the auth cache
    Auth(auth::AuthArgs),
    /// Admin profile management
    Admin(admin::AdminArgs),
    /// Talk to the website chatbot webhook
    Chat(chat::ChatArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Auth(args) => auth::execute(args, &self.config, self.format).await,
            Commands::Admin(args) => admin::execute(args, &self.config, self.format).await,
            Commands::Chat(args) => chat::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::from_file(config_path)
}

/// Helper: wire the session layer for a headless host
pub async fn connect(config: &AppConfig) -> Result<Backoffice, AppError> {
    Backoffice::connect(config, Arc::new(HeadlessPage::default())).await
}

/// Helper: map a dialoguer failure
pub(crate) fn input_error(e: dialoguer::Error) -> AppError {
    AppError::internal(format!("Input error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_auth_login() {
        let cli = Cli::try_parse_from(["gch", "-f", "json", "auth", "login", "-e", "a@gch.com"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Auth(auth::AuthArgs {
                command: auth::AuthCommand::Login { .. }
            })
        ));
    }

    #[test]
    fn test_parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["gch"]).is_err());
    }
}
