//! File-backed persistent store.

pub mod store;

pub use store::FileKeyValueStore;
