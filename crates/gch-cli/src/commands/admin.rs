//! Admin profile management commands.

use std::str::FromStr;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use gch_auth::AdminProfileStore;
use gch_core::error::AppError;
use gch_entity::admin::{AdminProfile, AdminRole, NewAdminProfile, UpdateAdminProfile};

use crate::output::{self, OutputFormat, or_dash};

/// Arguments for admin commands
#[derive(Debug, Args)]
pub struct AdminArgs {
    /// Admin subcommand
    #[command(subcommand)]
    pub command: AdminCommand,
}

/// Admin subcommands
#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// List admin profiles
    List,
    /// Show one profile by identity ID or email
    Show {
        /// Identity ID or email
        target: String,
    },
    /// Attach an admin profile to an existing identity
    Create {
        /// Identity ID the profile belongs to
        #[arg(short, long)]
        user_id: Uuid,
        /// Email
        #[arg(short, long)]
        email: Option<String>,
        /// Display name
        #[arg(short = 'n', long)]
        full_name: Option<String>,
        /// Role (super_admin, admin, editor)
        #[arg(short, long, default_value = "editor")]
        role: String,
        /// Create the profile deactivated
        #[arg(long)]
        inactive: bool,
    },
    /// Change fields of an existing profile
    Update {
        /// Identity ID or email
        target: String,
        /// New email
        #[arg(short, long)]
        email: Option<String>,
        /// New display name
        #[arg(short = 'n', long)]
        full_name: Option<String>,
        /// New role
        #[arg(short, long)]
        role: Option<String>,
        /// Activate or deactivate
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a profile
    Delete {
        /// Identity ID or email
        target: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct AdminRow {
    /// Profile ID
    id: String,
    /// Identity ID
    user_id: String,
    /// Email
    email: String,
    /// Name
    name: String,
    /// Role
    role: String,
    /// Active
    active: bool,
    /// Last login
    last_login: String,
}

impl From<&AdminProfile> for AdminRow {
    fn from(profile: &AdminProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            user_id: profile.user_id.to_string(),
            email: profile.email.clone(),
            name: profile.full_name.clone(),
            role: profile.role.to_string(),
            active: profile.is_active,
            last_login: or_dash(
                profile
                    .last_login
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string()),
            ),
        }
    }
}

/// Execute admin commands
pub async fn execute(
    args: &AdminArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let store = super::connect(&config).await?.admin_store;

    match &args.command {
        AdminCommand::List => {
            let profiles = store.list().await?;
            let rows: Vec<AdminRow> = profiles.iter().map(AdminRow::from).collect();
            output::print_list(&rows, format);
        }
        AdminCommand::Show { target } => {
            let profile = find(store.as_ref(), target).await?;
            output::print_list(&[AdminRow::from(&profile)], format);
        }
        AdminCommand::Create {
            user_id,
            email,
            full_name,
            role,
            inactive,
        } => {
            let email = match email {
                Some(e) => e.clone(),
                None => dialoguer::Input::new()
                    .with_prompt("Admin email")
                    .interact_text()
                    .map_err(super::input_error)?,
            };
            let full_name = match full_name {
                Some(n) => n.clone(),
                None => dialoguer::Input::new()
                    .with_prompt("Full name")
                    .interact_text()
                    .map_err(super::input_error)?,
            };

            let profile = store
                .insert(NewAdminProfile {
                    user_id: *user_id,
                    email,
                    full_name,
                    role: AdminRole::from_str(role)?,
                    is_active: !inactive,
                })
                .await?;

            output::print_success(&format!(
                "Admin profile for '{}' created (id: {})",
                profile.email, profile.id
            ));
        }
        AdminCommand::Update {
            target,
            email,
            full_name,
            role,
            active,
        } => {
            let existing = find(store.as_ref(), target).await?;
            let changes = UpdateAdminProfile {
                email: email.clone(),
                full_name: full_name.clone(),
                role: role.as_deref().map(AdminRole::from_str).transpose()?,
                is_active: *active,
                last_login: None,
            };
            if changes.is_empty() {
                output::print_warning("Nothing to update");
                return Ok(());
            }

            let updated = store.update(existing.id, changes).await?;
            output::print_success(&format!("Admin profile '{}' updated", updated.email));
        }
        AdminCommand::Delete { target, yes } => {
            let existing = find(store.as_ref(), target).await?;
            if !yes {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Delete admin profile '{}'? The identity will lose back-office access.",
                        existing.email
                    ))
                    .default(false)
                    .interact()
                    .map_err(super::input_error)?;
                if !confirmed {
                    output::print_warning("Aborted");
                    return Ok(());
                }
            }

            if store.delete(existing.id).await? {
                output::print_success(&format!("Admin profile '{}' deleted", existing.email));
            } else {
                output::print_warning("Profile was already gone");
            }
        }
    }

    Ok(())
}

/// Look a profile up by identity ID, falling back to email.
async fn find(
    store: &dyn AdminProfileStore,
    target: &str,
) -> Result<AdminProfile, AppError> {
    let found = match Uuid::parse_str(target) {
        Ok(user_id) => store.find_by_user_id(user_id).await?,
        Err(_) => store.find_by_email(target).await?,
    };
    found.ok_or_else(|| AppError::not_found(format!("Admin profile '{target}' not found")))
}
