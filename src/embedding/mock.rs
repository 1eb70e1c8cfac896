use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::{EmbeddingError, TitleEmbedder};

/// Embedder with pinned vectors per title, for tests.
///
/// Unpinned titles get a one-hot vector derived from the title hash.
#[derive(Debug)]
pub struct MockEmbedder {
    dim: usize,
    pinned: RwLock<HashMap<String, Vec<f32>>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim: dim.max(1),
            pinned: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Pins `vector` (padded or truncated to the mock's dimension) for `title`.
    pub fn pin(&self, title: &str, vector: &[f32]) {
        let mut v = vector.to_vec();
        v.resize(self.dim, 0.0);
        self.pinned.write().insert(title.to_string(), v);
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed_batch` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, title: &str) -> Vec<f32> {
        if let Some(v) = self.pinned.read().get(title) {
            return v.clone();
        }
        let mut v = vec![0.0; self.dim];
        let idx = crate::hashing::fingerprint_u64(title) as usize % self.dim;
        v[idx] = 1.0;
        v
    }
}

impl TitleEmbedder for MockEmbedder {
    fn embed_batch(&self, titles: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::InferenceFailed {
                reason: "mock embedder set to fail".to_string(),
            });
        }
        Ok(titles.iter().map(|t| self.vector_for(t)).collect())
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }
}
