//! In-memory backends.

pub mod response;
pub mod store;

pub use response::MemoryResponseCache;
pub use store::MemoryKeyValueStore;
