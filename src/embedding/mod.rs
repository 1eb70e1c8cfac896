//! Title embeddings.
//!
//! - [`TitleEmbedder`] is the seam the similarity cache and the confidence pass
//!   call through.
//! - [`minilm`] provides the MiniLM sentence embedder (and its stub mode).

/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// MiniLM sentence embedder.
pub mod minilm;
/// Tokenizer loading helpers.
pub mod utils;

#[cfg(any(test, feature = "mock"))]
mod mock;

pub use error::EmbeddingError;
pub use minilm::{MINILM_EMBEDDING_DIM, MINILM_MAX_SEQ_LEN, MiniLmConfig, MiniLmEmbedder};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;

/// Maps normalized titles to fixed-dimension vectors, in input order.
pub trait TitleEmbedder: Send + Sync {
    /// Embeds every title; the result has one vector per input, same order.
    fn embed_batch(&self, titles: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Output dimension.
    fn embedding_dim(&self) -> usize;

    /// Embeds a single title.
    fn embed(&self, title: &str) -> Result<Vec<f32>, EmbeddingError> {
        let vectors = self.embed_batch(&[title])?;
        let actual = vectors.len();
        match vectors.into_iter().next() {
            Some(vector) if actual == 1 => Ok(vector),
            _ => Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual,
            }),
        }
    }
}
