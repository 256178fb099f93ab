//! Session state machine states.

use std::fmt;

use serde::Serialize;

use gch_entity::identity::ResolvedIdentity;

/// Where the coordinator is in resolving the current identity.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "identity", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing has been resolved yet.
    #[default]
    Unresolved,
    /// A state-changing operation is in flight.
    Resolving,
    /// Resolution finished; `None` means signed out.
    Resolved(Option<ResolvedIdentity>),
}

impl SessionState {
    /// The signed-out terminal state.
    pub const SIGNED_OUT: SessionState = SessionState::Resolved(None);

    /// The resolved identity, if signed in.
    pub fn identity(&self) -> Option<&ResolvedIdentity> {
        match self {
            Self::Resolved(Some(identity)) => Some(identity),
            _ => None,
        }
    }

    /// Whether resolution has finished.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Whether an admin identity is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }

    /// Short name for logs and tables.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolving => "resolving",
            Self::Resolved(Some(_)) => "signed_in",
            Self::Resolved(None) => "signed_out",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity() {
            Some(identity) => write!(
                f,
                "signed in as {}",
                identity.email.as_deref().unwrap_or("<no email>")
            ),
            None => f.write_str(self.name()),
        }
    }
}
