//! Direct Postgres access to the admin table (feature `postgres`).

pub mod admin_store;

pub use admin_store::PgAdminProfileStore;
