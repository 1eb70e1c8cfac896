use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::storage::error::StorageResult;
use crate::storage::model::CacheEntry;
use crate::storage::store::CacheStore;

/// Process-local [`CacheStore`]; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<[u8; 32], CacheEntry>>,
    writes: AtomicUsize,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of upserts that changed the stored value.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key_hash: &[u8; 32]) -> StorageResult<Option<CacheEntry>> {
        Ok(self.entries.read().get(key_hash).cloned())
    }

    fn upsert(&self, entry: &CacheEntry) -> StorageResult<()> {
        let mut entries = self.entries.write();
        if entries
            .get(&entry.key_hash)
            .is_some_and(|existing| existing.same_value(entry))
        {
            return Ok(());
        }
        entries.insert(entry.key_hash, entry.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
