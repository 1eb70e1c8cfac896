use thiserror::Error;

use crate::embedding::EmbeddingError;

/// Errors from the cluster confidence pass.
#[derive(Debug, Error)]
pub enum ConfidenceError {
    /// The embedding backend failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Parallel inputs disagree in length.
    #[error("length mismatch: {titles} titles, {labels} labelled pairs, {base} base scores")]
    LengthMismatch {
        titles: usize,
        labels: usize,
        base: usize,
    },

    /// Embeddings came back with inconsistent dimensions.
    #[error("embedding {index} has dimension {actual}, expected {expected}")]
    RaggedEmbeddings {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

pub type ConfidenceResult<T> = Result<T, ConfidenceError>;
