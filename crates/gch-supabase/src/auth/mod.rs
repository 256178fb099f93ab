//! GoTrue identity provider.

pub mod gotrue;
mod wire;

pub use gotrue::GoTrueIdentityProvider;
