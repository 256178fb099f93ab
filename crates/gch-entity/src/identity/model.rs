//! Identity models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admin::AdminProfile;

/// A user as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Unique identity ID.
    pub id: Uuid,
    /// Email address (may be absent for phone/anonymous sign-ins).
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata set at sign-up.
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,
}

impl ExternalIdentity {
    /// Create an identity with no metadata.
    pub fn new(id: Uuid, email: Option<String>) -> Self {
        Self {
            id,
            email,
            user_metadata: HashMap::new(),
        }
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Display name from `full_name`/`name` metadata, else the email local part.
    pub fn display_name(&self) -> Option<String> {
        self.metadata_str("full_name")
            .or_else(|| self.metadata_str("name"))
            .map(str::to_string)
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
    }

    /// Avatar reference from `avatar_url`/`picture` metadata.
    pub fn avatar_url(&self) -> Option<String> {
        self.metadata_str("avatar_url")
            .or_else(|| self.metadata_str("picture"))
            .map(str::to_string)
    }
}

/// The identity the back-office works with after authorization.
///
/// Built fresh on every successful resolution and replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    /// External identity ID.
    pub id: Uuid,
    /// Email address.
    pub email: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar reference.
    pub avatar_url: Option<String>,
    /// Whether an active admin profile was found.
    pub is_admin: bool,
    /// The admin profile, when authorized.
    pub admin_profile: Option<AdminProfile>,
}

impl ResolvedIdentity {
    /// Build an identity from the collaborator's user and the gate's verdict.
    ///
    /// The admin profile's name wins over metadata when present.
    pub fn build(user: &ExternalIdentity, admin_profile: Option<AdminProfile>) -> Self {
        let is_admin = admin_profile.as_ref().is_some_and(|p| p.is_active);
        let display_name = admin_profile
            .as_ref()
            .map(|p| p.full_name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| user.display_name());

        Self {
            id: user.id,
            email: user.email.clone(),
            display_name,
            avatar_url: user.avatar_url(),
            is_admin,
            admin_profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminRole;
    use chrono::Utc;

    fn user() -> ExternalIdentity {
        let mut user = ExternalIdentity::new(Uuid::nil(), Some("maria@gch.com".to_string()));
        user.user_metadata.insert(
            "avatar_url".to_string(),
            serde_json::json!("https://cdn.example/avatar.png"),
        );
        user
    }

    #[test]
    fn test_display_name_falls_back_to_email_local_part() {
        assert_eq!(user().display_name().as_deref(), Some("maria"));
    }

    #[test]
    fn test_build_prefers_profile_name() {
        let now = Utc::now();
        let profile = AdminProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            email: "maria@gch.com".to_string(),
            full_name: "María García".to_string(),
            role: AdminRole::Admin,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        let identity = ResolvedIdentity::build(&user(), Some(profile));
        assert!(identity.is_admin);
        assert_eq!(identity.display_name.as_deref(), Some("María García"));
        assert_eq!(
            identity.avatar_url.as_deref(),
            Some("https://cdn.example/avatar.png")
        );
    }

    #[test]
    fn test_build_without_profile_is_not_admin() {
        let identity = ResolvedIdentity::build(&user(), None);
        assert!(!identity.is_admin);
        assert!(identity.admin_profile.is_none());
    }
}
