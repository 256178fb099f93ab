//! Core traits defined in `gch-core` and implemented by other crates.

pub mod kv_store;
pub mod page;
pub mod response_cache;

pub use kv_store::{KeyValueStore, StorageScope};
pub use page::{HeadlessPage, PageContext};
pub use response_cache::ResponseCache;
