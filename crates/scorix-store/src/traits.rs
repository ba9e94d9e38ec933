//! The store trait all key/value backends implement.

use async_trait::async_trait;

use crate::error::StoreError;

/// Key/value store with a primary (authoritative) partition and a
/// TTL-bounded cache partition.
///
/// Implementations must be thread-safe (`Send + Sync`); the store is
/// constructed once at process start and shared by every request handler.
///
/// The `cache_*` operations address the cache partition; `cache_get`
/// falls through to a best-effort primary read on a miss and never fails
/// because of the primary, only because of the cache connection itself.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads `key` from the primary partition.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the key is absent — never a
    /// silent null. Returns `StoreError::Connection` when the reconnect
    /// budget is exhausted.
    async fn get(&self, key: &str) -> Result<String, StoreError>;

    /// Writes `key` to the primary partition. The entry is durable until
    /// explicitly deleted.
    async fn set(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Removes `key` from the primary partition, returning the number of
    /// entries removed (0 or 1).
    async fn delete(&self, key: &str) -> Result<usize, StoreError>;

    /// Best-effort read: cache partition first, then the primary.
    ///
    /// Returns `None` on a double miss. Primary-read failures are logged
    /// and suppressed; only a cache-connection failure is returned.
    async fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `key` into the cache partition with the configured TTL.
    /// The entry expires autonomously; no eviction call is needed.
    async fn cache_set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
