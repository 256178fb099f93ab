//! PostgREST-backed stores.

pub mod admin_store;

pub use admin_store::RestAdminProfileStore;
