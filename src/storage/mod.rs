//! Persistence for the exact cache and the similarity index.
//!
//! [`CacheStore`] is the repository seam the cache layer writes through;
//! [`NvmeCacheStore`] keeps one rkyv file per entry, [`MemoryCacheStore`] keeps
//! nothing across restarts.

pub mod error;
pub mod memory;
pub mod mmap;
mod model;
pub mod nvme;
pub mod snapshot;
mod store;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryCacheStore;
pub use model::{
    ArchivedCacheEntry, ArchivedSimilarityRecord, ArchivedSimilaritySnapshot, CacheEntry,
    SimilarityRecord, SimilaritySnapshot,
};
pub use nvme::NvmeCacheStore;
pub use snapshot::{read_snapshot, write_snapshot};
pub use store::CacheStore;
