//! Read-only memory maps over rkyv files.

pub mod error;

pub use error::{MmapError, MmapResult};

use std::fs::File;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use rkyv::rancor::Error as RkyvError;

use crate::storage::model::{CacheEntry, SimilaritySnapshot};

/// Cheaply clonable read-only mapping of one file.
#[derive(Clone)]
pub struct MmapFileHandle {
    inner: Arc<Mmap>,
    path: Arc<std::path::PathBuf>,
}

impl std::fmt::Debug for MmapFileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapFileHandle")
            .field("path", &self.path)
            .field("len", &self.len())
            .field("strong_count", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl MmapFileHandle {
    pub fn open<P: AsRef<Path>>(path: P) -> MmapResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        if file.metadata()?.len() == 0 {
            return Err(MmapError::EmptyFile);
        }

        // SAFETY: files are only ever replaced by rename, never truncated in place,
        // so the mapped pages stay valid for the lifetime of the handle.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(Self {
            inner: Arc::new(mmap),
            path: Arc::new(path.to_path_buf()),
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        self.inner.deref()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validates and deserializes the mapped bytes as a [`CacheEntry`].
    pub fn to_cache_entry(&self) -> MmapResult<CacheEntry> {
        rkyv::from_bytes::<CacheEntry, RkyvError>(self.as_slice())
            .map_err(|e| MmapError::Rejected(e.to_string()))
    }

    /// Validates and deserializes the mapped bytes as a [`SimilaritySnapshot`].
    pub fn to_similarity_snapshot(&self) -> MmapResult<SimilaritySnapshot> {
        rkyv::from_bytes::<SimilaritySnapshot, RkyvError>(self.as_slice())
            .map_err(|e| MmapError::Rejected(e.to_string()))
    }
}
