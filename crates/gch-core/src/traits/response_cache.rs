//! Response cache trait so invalidation can clear caches it does not own.

use async_trait::async_trait;

use crate::result::AppResult;

/// A cache of collaborator responses that can be flushed wholesale.
#[async_trait]
pub trait ResponseCache: Send + Sync + std::fmt::Debug + 'static {
    /// A short name for logging.
    fn name(&self) -> &str;

    /// Drop every cached response. Returns the number of entries dropped.
    async fn clear(&self) -> AppResult<u64>;
}
