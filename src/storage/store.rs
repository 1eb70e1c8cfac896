use crate::storage::error::StorageResult;
use crate::storage::model::CacheEntry;

/// Durable key-value table behind the exact cache.
///
/// Point lookup by key hash and upsert are all the cache needs, so any medium
/// that offers those two operations can back it.
pub trait CacheStore: Send + Sync {
    /// Returns the entry stored under `key_hash`, if any.
    fn get(&self, key_hash: &[u8; 32]) -> StorageResult<Option<CacheEntry>>;

    /// Inserts or replaces the entry under `entry.key_hash` (last write wins).
    fn upsert(&self, entry: &CacheEntry) -> StorageResult<()>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
