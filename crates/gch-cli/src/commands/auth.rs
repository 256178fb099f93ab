//! Sign-in, sign-out and auth cache commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use gch_auth::CacheDiagnostics;
use gch_core::error::AppError;
use gch_entity::identity::ResolvedIdentity;

use crate::output::{self, OutputFormat, or_dash};

/// Arguments for auth commands
#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Auth subcommand
    #[command(subcommand)]
    pub command: AuthCommand,
}

/// Auth subcommands
#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Sign in with email and password
    Login {
        /// Email
        #[arg(short, long)]
        email: Option<String>,
        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign out and clear the auth cache
    Logout,
    /// Resolve and show the signed-in admin
    Whoami,
    /// Show what the auth cache holds
    Status,
    /// Remove every cached auth key and response
    ClearCache {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct IdentityRow {
    /// Identity ID
    id: String,
    /// Email
    email: String,
    /// Display name
    name: String,
    /// Role
    role: String,
    /// Last login
    last_login: String,
}

impl From<&ResolvedIdentity> for IdentityRow {
    fn from(identity: &ResolvedIdentity) -> Self {
        let profile = identity.admin_profile.as_ref();
        Self {
            id: identity.id.to_string(),
            email: or_dash(identity.email.as_deref()),
            name: or_dash(identity.display_name.as_deref()),
            role: or_dash(profile.map(|p| p.role)),
            last_login: or_dash(
                profile
                    .and_then(|p| p.last_login)
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string()),
            ),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct KeyRow {
    /// Storage key
    key: String,
    /// Present
    present: String,
}

/// Execute auth commands
pub async fn execute(
    args: &AuthArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let backoffice = super::connect(&config).await?;
    let coordinator = backoffice.coordinator;

    match &args.command {
        AuthCommand::Login { email, password } => {
            let email = match email {
                Some(e) => e.clone(),
                None => dialoguer::Input::new()
                    .with_prompt("Email")
                    .interact_text()
                    .map_err(super::input_error)?,
            };

            let password = match password {
                Some(p) => p.clone(),
                None => dialoguer::Password::new()
                    .with_prompt("Password")
                    .interact()
                    .map_err(super::input_error)?,
            };

            let identity = coordinator.sign_in(&email, &password).await?;
            match format {
                OutputFormat::Table => output::print_success(&format!(
                    "Signed in as {}",
                    identity.email.as_deref().unwrap_or(&email)
                )),
                OutputFormat::Json => output::print_json(&identity),
            }
        }
        AuthCommand::Logout => {
            // The provider revokes the mirrored session itself.
            coordinator.sign_out().await?;
            output::print_success("Signed out");
        }
        AuthCommand::Whoami => match coordinator.recheck().await? {
            Some(identity) => output::print_list(&[IdentityRow::from(&identity)], format),
            None => output::print_warning("Not signed in"),
        },
        AuthCommand::Status => {
            let diagnostics = coordinator.diagnostics().await;
            print_diagnostics(&diagnostics, format);
        }
        AuthCommand::ClearCache { yes } => {
            if !yes {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt("Remove all cached auth state? You will be signed out.")
                    .default(false)
                    .interact()
                    .map_err(super::input_error)?;
                if !confirmed {
                    output::print_warning("Aborted");
                    return Ok(());
                }
            }

            let report = coordinator.clear_cache().await?;
            match format {
                OutputFormat::Table => {
                    output::print_success("Auth cache cleared");
                    output::print_kv(
                        "Persistent keys",
                        &report.persistent_keys_removed.to_string(),
                    );
                    output::print_kv("Session keys", &report.session_keys_cleared.to_string());
                    output::print_kv(
                        "Cached responses",
                        &report.response_entries_cleared.to_string(),
                    );
                    if report.failures > 0 {
                        output::print_warning(&format!(
                            "{} storage operations failed",
                            report.failures
                        ));
                    }
                }
                OutputFormat::Json => output::print_json(&report),
            }
        }
    }

    Ok(())
}

fn print_diagnostics(diagnostics: &CacheDiagnostics, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(diagnostics);
        return;
    }

    println!("Auth cache: {}", diagnostics.verdict());
    output::print_kv("State", &diagnostics.state);
    output::print_kv("Signed in as", &or_dash(diagnostics.signed_in_as.as_deref()));
    output::print_kv(
        "Expires at",
        &or_dash(diagnostics.expires_at.map(|at| at.to_rfc3339())),
    );
    output::print_kv(
        "Expires in (s)",
        &or_dash(diagnostics.expires_in_seconds),
    );
    output::print_kv("Stale", &diagnostics.stale.to_string());
    output::print_kv("Session keys", &diagnostics.session_keys.to_string());
    output::print_kv("Stale evictions", &diagnostics.stale_evictions.to_string());
    output::print_kv("Last error", &or_dash(diagnostics.last_error.as_deref()));

    let rows: Vec<KeyRow> = diagnostics
        .token_keys
        .iter()
        .map(|k| KeyRow {
            key: k.key.clone(),
            present: if k.present { "yes" } else { "no" }.to_string(),
        })
        .chain(diagnostics.other_auth_keys.iter().map(|k| KeyRow {
            key: k.clone(),
            present: "yes".to_string(),
        }))
        .collect();
    output::print_list(&rows, format);

    for error in &diagnostics.storage_errors {
        output::print_warning(error);
    }
}
