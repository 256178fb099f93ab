//! # gch-supabase
//!
//! Supabase-backed collaborators for the session layer:
//!
//! - [`GoTrueIdentityProvider`] — email/password sessions over the GoTrue REST API
//! - [`RestAdminProfileStore`] — the `admin_users` table over PostgREST, with response caching
//! - `PgAdminProfileStore` — the same table over a direct Postgres pool (feature `postgres`)
//! - [`Backoffice`] — builds all of the above plus the session coordinator from configuration

pub mod auth;
pub mod bootstrap;
pub mod client;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod rest;

pub use auth::GoTrueIdentityProvider;
pub use bootstrap::Backoffice;
pub use client::SupabaseClient;
#[cfg(feature = "postgres")]
pub use postgres::PgAdminProfileStore;
pub use rest::RestAdminProfileStore;
