//! Collaborator traits consumed by the session layer.
//!
//! The identity collaborator owns credentials and sessions; the admin-profile
//! store owns the `admin_users` table. Both are injected as trait objects so
//! the coordinator can run against HTTP clients, a database, or the in-memory
//! backends in [`memory`].

pub mod admin_store;
pub mod identity;
pub mod memory;

pub use admin_store::AdminProfileStore;
pub use identity::{AuthChangeEvent, IdentityProvider};
pub use memory::{MemoryAdminProfileStore, MemoryIdentityProvider};
