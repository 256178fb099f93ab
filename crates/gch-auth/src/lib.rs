//! # gch-auth
//!
//! Session and authorization layer for the GCH Servicios back-office.
//!
//! ## Modules
//!
//! - `staleness` — pure expiry look-ahead check for cached session tokens
//! - `invalidator` — clears every trace of auth state from storage and caches
//! - `gate` — fail-closed admin authorization over the admin-profile store
//! - `session` — the coordinator state machine, listeners and scheduled re-check
//! - `provider` — identity and admin-profile collaborator traits, plus in-memory backends
//! - `diagnostics` — point-in-time report of the auth cache

pub mod diagnostics;
pub mod error;
pub mod gate;
pub mod invalidator;
pub mod provider;
pub mod session;
pub mod staleness;

pub use diagnostics::CacheDiagnostics;
pub use error::AuthError;
pub use gate::{AdminCheck, AdminGate};
pub use invalidator::{CacheInvalidator, InvalidationReport, ReloadPolicy};
pub use provider::{AdminProfileStore, AuthChangeEvent, IdentityProvider};
pub use session::{RecheckScheduler, SessionCoordinator, SessionState, Subscription};
pub use staleness::StalenessDetector;
