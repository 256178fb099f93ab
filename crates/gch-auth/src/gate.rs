//! Admin authorization gate.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use gch_entity::admin::AdminProfile;

use crate::provider::AdminProfileStore;

/// Outcome of an admin check.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdminCheck {
    /// Whether an active admin profile exists.
    pub is_admin: bool,
    /// The active profile, when `is_admin` is true.
    pub profile: Option<AdminProfile>,
}

impl AdminCheck {
    /// The fail-closed verdict.
    pub fn denied() -> Self {
        Self::default()
    }
}

/// Decides whether an external identity may use the back-office.
///
/// Fails closed: a missing profile, an inactive profile and a store error
/// all deny access.
#[derive(Debug, Clone)]
pub struct AdminGate {
    store: Arc<dyn AdminProfileStore>,
}

impl AdminGate {
    /// Create a gate over an admin-profile store.
    pub fn new(store: Arc<dyn AdminProfileStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn AdminProfileStore> {
        &self.store
    }

    /// Check whether `user_id` has an active admin profile.
    pub async fn check(&self, user_id: Uuid) -> AdminCheck {
        match self.store.find_by_user_id(user_id).await {
            Ok(Some(profile)) if profile.grants_access() => {
                debug!(user_id = %user_id, role = %profile.role, "Admin check passed");
                AdminCheck {
                    is_admin: true,
                    profile: Some(profile),
                }
            }
            Ok(Some(_)) => {
                debug!(user_id = %user_id, "Admin profile is inactive");
                AdminCheck::denied()
            }
            Ok(None) => {
                debug!(user_id = %user_id, "No admin profile found");
                AdminCheck::denied()
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Admin check failed, denying access");
                AdminCheck::denied()
            }
        }
    }

    /// Stamp the last-login instant. Failures are logged and ignored.
    pub async fn record_login(&self, user_id: Uuid) {
        if let Err(e) = self.store.touch_last_login(user_id, Utc::now()).await {
            warn!(user_id = %user_id, error = %e, "Failed to update last login");
        }
    }
}
