//! Session coordination.
//!
//! [`SessionCoordinator`] owns the session state machine and is the only
//! writer of the mirrored token record. UI consumers observe it through
//! [`Subscription`]s or a `watch` receiver; [`RecheckScheduler`] drives the
//! periodic staleness check.

pub mod coordinator;
pub mod listeners;
pub mod recheck;
pub mod state;

pub use coordinator::SessionCoordinator;
pub use listeners::{ListenerRegistry, Subscription};
pub use recheck::RecheckScheduler;
pub use state::SessionState;
