//! Exact-match cache.
//!
//! A moka cache keyed by the BLAKE3 fingerprint of the normalized title sits in
//! front of a [`CacheStore`]. Reads fall through to the store and warm the
//! in-memory layer; writes go to both.

use std::sync::Arc;

use moka::sync::Cache;
use tracing::warn;

use crate::hashing::{fingerprint, key_hash_hex};
use crate::storage::{CacheEntry, CacheStore, MemoryCacheStore};

/// In-memory exact cache over a durable store.
pub struct ExactCache {
    entries: Cache<[u8; 32], CacheEntry>,
    store: Arc<dyn CacheStore>,
}

impl std::fmt::Debug for ExactCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExactCache")
            .field("l1_entries", &self.entries.entry_count())
            .field("store", &self.store.backend_name())
            .finish()
    }
}

impl ExactCache {
    const DEFAULT_CAPACITY: u64 = 10_000;

    /// Creates a cache over `store` with a max in-memory capacity.
    pub fn new(store: Arc<dyn CacheStore>, capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
            store,
        }
    }

    /// Cache backed by a fresh [`MemoryCacheStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()), Self::DEFAULT_CAPACITY)
    }

    /// Looks up a normalized title.
    #[inline]
    pub fn lookup(&self, normalized: &str) -> Option<CacheEntry> {
        self.lookup_by_hash(&fingerprint(normalized))
    }

    /// Looks up by fingerprint; store errors are logged and read as a miss.
    pub fn lookup_by_hash(&self, hash: &[u8; 32]) -> Option<CacheEntry> {
        if let Some(entry) = self.entries.get(hash) {
            return Some(entry);
        }

        match self.store.get(hash) {
            Ok(Some(entry)) => {
                self.entries.insert(*hash, entry.clone());
                Some(entry)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(
                    key = %key_hash_hex(hash),
                    backend = self.store.backend_name(),
                    error = %e,
                    "Cache store read failed; treating as miss"
                );
                None
            }
        }
    }

    /// Writes an entry to memory and the store; store errors are logged.
    ///
    /// Returns `false` if the durable write failed.
    pub fn insert(&self, entry: CacheEntry) -> bool {
        if self
            .entries
            .get(&entry.key_hash)
            .is_some_and(|existing| existing.same_value(&entry))
        {
            return true;
        }

        let persisted = match self.store.upsert(&entry) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    key = %key_hash_hex(&entry.key_hash),
                    backend = self.store.backend_name(),
                    error = %e,
                    "Cache store write failed; entry kept in memory only"
                );
                false
            }
        };
        self.entries.insert(entry.key_hash, entry);
        persisted
    }

    /// Returns `true` if the in-memory layer holds `hash`.
    #[inline]
    pub fn contains_hash(&self, hash: &[u8; 32]) -> bool {
        self.entries.contains_key(hash)
    }

    /// Number of in-memory entries (approximate until pending tasks run).
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    /// Drops the in-memory layer; the store is untouched.
    #[inline]
    pub fn clear_memory(&self) {
        self.entries.invalidate_all();
    }

    /// Runs any pending maintenance tasks in the underlying cache.
    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }
}
