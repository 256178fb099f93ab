//! Session token records as mirrored into browser-like storage.

pub mod record;

pub use record::{RecordPresence, SessionTokenRecord};

use serde::{Deserialize, Serialize};

use crate::identity::ExternalIdentity;

/// An active session as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    /// The credential triple.
    pub record: SessionTokenRecord,
    /// The identity the credential belongs to.
    pub user: ExternalIdentity,
}
