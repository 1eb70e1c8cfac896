use std::io;
use thiserror::Error;

/// Failures opening or decoding a mapped rkyv file.
#[derive(Error, Debug)]
pub enum MmapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot map an empty file")]
    EmptyFile,

    /// Archived bytes did not pass `bytecheck` for the requested record type.
    #[error("archived record rejected: {0}")]
    Rejected(String),
}

pub type MmapResult<T> = Result<T, MmapError>;
