//! # gch-entity
//!
//! Data model for the GCH back-office session toolkit. Every struct in this
//! crate is either a collaborator record (admin profile, external identity,
//! session token) or a value object built from them. All entities derive
//! `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod admin;
pub mod identity;
pub mod session;

pub use admin::{AdminProfile, AdminRole, NewAdminProfile, UpdateAdminProfile};
pub use identity::{ExternalIdentity, ResolvedIdentity};
pub use session::{AuthSession, RecordPresence, SessionTokenRecord};
