//! Similarity index snapshot files.

use std::fs;
use std::io::Write;
use std::path::Path;

use rkyv::rancor::Error as RkyvError;
use tempfile::NamedTempFile;
use tracing::info;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::mmap::{MmapError, MmapFileHandle};
use crate::storage::model::SimilaritySnapshot;

/// Writes `snapshot` to `path` atomically (temp file + rename).
pub fn write_snapshot(path: &Path, snapshot: &SimilaritySnapshot) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    fs::create_dir_all(&dir)?;

    let bytes = rkyv::to_bytes::<RkyvError>(snapshot)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(&bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| StorageError::Io(e.error))?;

    info!(
        path = %path.display(),
        records = snapshot.records.len(),
        bytes = bytes.len(),
        "Similarity snapshot written"
    );
    Ok(())
}

/// Reads a snapshot; `Ok(None)` when the file does not exist.
pub fn read_snapshot(path: &Path) -> StorageResult<Option<SimilaritySnapshot>> {
    if !path.exists() {
        return Ok(None);
    }

    let handle = match MmapFileHandle::open(path) {
        Ok(handle) => handle,
        Err(MmapError::EmptyFile) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let snapshot = handle
        .to_similarity_snapshot()
        .map_err(|e| StorageError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(Some(snapshot))
}
