//! Admin role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles an admin profile can carry.
///
/// Roles are ordered by privilege level: SuperAdmin > Admin > Editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Manages other admin profiles and all content.
    SuperAdmin,
    /// Manages projects, testimonials, hero video and settings.
    Admin,
    /// Edits content only.
    #[default]
    Editor,
}

impl AdminRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::SuperAdmin => 3,
            Self::Admin => 2,
            Self::Editor => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &AdminRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Whether this role may create, edit or remove other admin profiles.
    pub fn can_manage_admins(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Return the role as its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Editor => "editor",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = gch_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            _ => Err(gch_core::AppError::validation(format!(
                "Invalid admin role: '{s}'. Expected one of: super_admin, admin, editor"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(AdminRole::SuperAdmin.has_at_least(&AdminRole::Editor));
        assert!(AdminRole::Admin.has_at_least(&AdminRole::Admin));
        assert!(!AdminRole::Editor.has_at_least(&AdminRole::Admin));
        assert!(AdminRole::SuperAdmin.can_manage_admins());
        assert!(!AdminRole::Admin.can_manage_admins());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("super_admin".parse::<AdminRole>().unwrap(), AdminRole::SuperAdmin);
        assert_eq!("Super-Admin".parse::<AdminRole>().unwrap(), AdminRole::SuperAdmin);
        assert_eq!("EDITOR".parse::<AdminRole>().unwrap(), AdminRole::Editor);
        assert!("owner".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&AdminRole::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
    }
}
