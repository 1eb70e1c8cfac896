//! NVMe-backed cache store (simple file-per-entry layout).
//!
//! Entries live at `<root>/<first two hex chars>/<key hex>.rkyv`. Writes go to a
//! temp file in the same shard directory and are renamed into place, so readers
//! never observe a partially written entry.


use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rkyv::rancor::Error as RkyvError;
use rkyv::to_bytes;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::hashing::key_hash_hex;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::mmap::{MmapError, MmapFileHandle};
use crate::storage::model::CacheEntry;
use crate::storage::store::CacheStore;

const RKYV_EXTENSION: &str = "rkyv";

#[derive(Debug, Clone)]
/// Stores and retrieves [`CacheEntry`] records on disk.
pub struct NvmeCacheStore {
    storage_path: PathBuf,
}

impl NvmeCacheStore {
    /// Creates a store rooted at `storage_path`.
    pub fn new(storage_path: PathBuf) -> Self {
        Self { storage_path }
    }

    /// Returns the root storage directory.
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Ensures the root storage directory exists.
    pub fn ensure_storage_path(&self) -> StorageResult<()> {
        if !self.storage_path.exists() {
            fs::create_dir_all(&self.storage_path).map_err(|_| {
                StorageError::StorageUnavailable {
                    path: self.storage_path.clone(),
                }
            })?;
        }
        Ok(())
    }

    fn shard_path(&self, hex: &str) -> PathBuf {
        self.storage_path.join(&hex[..2])
    }

    fn entry_path(&self, key_hash: &[u8; 32]) -> PathBuf {
        let hex = key_hash_hex(key_hash);
        self.shard_path(&hex)
            .join(format!("{}.{}", hex, RKYV_EXTENSION))
    }

    /// Returns `true` if an entry file exists for `key_hash`.
    pub fn exists(&self, key_hash: &[u8; 32]) -> bool {
        self.entry_path(key_hash).exists()
    }

    /// Maps the stored entry for `key_hash` without decoding it.
    pub fn load_handle(&self, key_hash: &[u8; 32]) -> StorageResult<Option<MmapFileHandle>> {
        let path = self.entry_path(key_hash);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(MmapFileHandle::open(&path)?))
    }

    /// Removes the entry for `key_hash`; returns whether one existed.
    ///
    /// The pipeline never calls this; it exists for external pruning.
    pub fn remove(&self, key_hash: &[u8; 32]) -> StorageResult<bool> {
        let path = self.entry_path(key_hash);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    /// Number of entry files on disk.
    pub fn count(&self) -> StorageResult<usize> {
        if !self.storage_path.exists() {
            return Ok(0);
        }
        let mut count = 0;
        for shard in fs::read_dir(&self.storage_path)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for file in fs::read_dir(shard.path())? {
                let path = file?.path();
                if path.extension().is_some_and(|ext| ext == RKYV_EXTENSION) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

impl CacheStore for NvmeCacheStore {
    fn get(&self, key_hash: &[u8; 32]) -> StorageResult<Option<CacheEntry>> {
        let Some(handle) = self.load_handle(key_hash)? else {
            return Ok(None);
        };

        let entry = handle.to_cache_entry().map_err(|e| match e {
            MmapError::Io(io) => StorageError::Io(io),
            other => StorageError::Corrupt {
                path: handle.path().to_path_buf(),
                reason: other.to_string(),
            },
        })?;

        if entry.key_hash != *key_hash {
            return Err(StorageError::Corrupt {
                path: handle.path().to_path_buf(),
                reason: "key hash does not match file name".to_string(),
            });
        }

        Ok(Some(entry))
    }

    fn upsert(&self, entry: &CacheEntry) -> StorageResult<()> {
        if let Some(existing) = self.get(&entry.key_hash).ok().flatten()
            && existing.same_value(entry)
        {
            return Ok(());
        }

        self.ensure_storage_path()?;
        let final_path = self.entry_path(&entry.key_hash);
        let shard = final_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.storage_path.clone());
        fs::create_dir_all(&shard)?;

        let bytes = to_bytes::<RkyvError>(entry)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut temp = NamedTempFile::new_in(&shard)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&final_path).map_err(|e| StorageError::Io(e.error))?;

        debug!(
            key = %key_hash_hex(&entry.key_hash),
            bytes = bytes.len(),
            "Cache entry persisted"
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "nvme"
    }
}
