//! # gch-cache
//!
//! Storage plumbing for GCH session state:
//!
//! - **memory**: in-process key-value store using [dashmap](https://crates.io/crates/dashmap)
//!   and a TTL response cache using [moka](https://crates.io/crates/moka)
//! - **file**: JSON-file key-value store standing in for browser `localStorage`
//! - **probe**: the [`StorageProbe`] reading and writing the well-known auth keys
//!
//! Backends are selected at runtime based on configuration.

#[cfg(feature = "file")]
pub mod file;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod probe;
pub mod provider;

pub use probe::StorageProbe;
pub use provider::StorageManager;
