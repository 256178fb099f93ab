//! External identities and the resolved back-office identity built from them.

pub mod model;

pub use model::{ExternalIdentity, ResolvedIdentity};
