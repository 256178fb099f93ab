//! Admin profile entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::role::AdminRole;

/// A back-office administrator record in the `admin_users` table.
///
/// The presence of an active profile is what distinguishes a merely
/// authenticated identity from one allowed into the back-office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    /// Unique profile identifier.
    pub id: Uuid,
    /// The external identity this profile belongs to.
    pub user_id: Uuid,
    /// Contact email.
    pub email: String,
    /// Human-readable display name.
    pub full_name: String,
    /// Admin role.
    pub role: AdminRole,
    /// Whether the profile may currently sign in.
    pub is_active: bool,
    /// Last successful back-office sign-in.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

impl AdminProfile {
    /// Check whether this profile grants back-office access.
    pub fn grants_access(&self) -> bool {
        self.is_active
    }
}

/// Data required to create a new admin profile.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAdminProfile {
    /// External identity the profile is attached to.
    pub user_id: Uuid,
    /// Contact email.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Display name.
    #[validate(length(min = 1, max = 120, message = "must be between 1 and 120 characters"))]
    pub full_name: String,
    /// Assigned role.
    #[serde(default)]
    pub role: AdminRole,
    /// Whether the profile starts active.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Partial update for an existing admin profile.
///
/// Only fields that are `Some` are sent to the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAdminProfile {
    /// New contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "must be between 1 and 120 characters"))]
    pub full_name: Option<String>,
    /// New role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<AdminRole>,
    /// Activate or deactivate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Last-login stamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl UpdateAdminProfile {
    /// An update that only stamps the last-login instant.
    pub fn last_login(at: DateTime<Utc>) -> Self {
        Self {
            last_login: Some(at),
            ..Self::default()
        }
    }

    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.full_name.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
            && self.last_login.is_none()
    }

    /// Apply this update to a profile in place, bumping `updated_at`.
    pub fn apply_to(&self, profile: &mut AdminProfile, now: DateTime<Utc>) {
        if let Some(email) = &self.email {
            profile.email = email.clone();
        }
        if let Some(name) = &self.full_name {
            profile.full_name = name.clone();
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
        if let Some(active) = self.is_active {
            profile.is_active = active;
        }
        if let Some(at) = self.last_login {
            profile.last_login = Some(at);
        }
        profile.updated_at = now;
    }
}

fn default_active() -> bool {
    true
}
