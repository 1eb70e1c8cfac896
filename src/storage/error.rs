use std::path::PathBuf;
use thiserror::Error;

use crate::storage::mmap::MmapError;

/// Errors returned by cache stores and snapshot files.
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mmap error.
    #[error("mmap error: {0}")]
    Mmap(#[from] MmapError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored bytes did not decode as the expected record.
    #[error("corrupt record at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Storage root path is missing/unavailable.
    #[error("storage path unavailable: {path}")]
    StorageUnavailable { path: PathBuf },
}

/// Convenience result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
