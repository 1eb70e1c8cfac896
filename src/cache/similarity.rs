//! Similarity index: nearest previously-categorized title by cosine similarity.
//!
//! Embeddings are kept as f16 to halve memory; queries stay f32. The index
//! only grows during a run and round-trips through a [`SimilaritySnapshot`].

use std::collections::HashMap;
use std::path::Path;

use half::f16;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::storage::{
    SimilarityRecord, SimilaritySnapshot, StorageResult, read_snapshot, write_snapshot,
};
use crate::taxonomy::{CategoryPair, Taxonomy};

/// Best neighbour returned by [`SimilarityIndex::best_match`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatch {
    pub title: String,
    pub pair: CategoryPair,
    pub similarity: f32,
}

#[derive(Debug, Clone)]
struct IndexedTitle {
    title: String,
    pair: CategoryPair,
    embedding: Vec<f16>,
}

#[derive(Debug, Default)]
struct IndexInner {
    rows: Vec<IndexedTitle>,
    by_title: HashMap<String, usize>,
}

/// Title → (pair, embedding) map searched by brute-force cosine similarity.
#[derive(Debug)]
pub struct SimilarityIndex {
    dim: usize,
    inner: RwLock<IndexInner>,
}

impl SimilarityIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            inner: RwLock::new(IndexInner::default()),
        }
    }

    #[inline]
    pub fn embedding_dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().rows.is_empty()
    }

    /// Adds or overwrites `title`. Vectors of the wrong dimension are rejected.
    pub fn insert(&self, title: &str, pair: CategoryPair, embedding: &[f32]) -> bool {
        if embedding.len() != self.dim {
            warn!(
                title,
                expected = self.dim,
                actual = embedding.len(),
                "Embedding dimension mismatch; not indexed"
            );
            return false;
        }

        let row = IndexedTitle {
            title: title.to_string(),
            pair,
            embedding: f32_to_f16_vec(embedding),
        };

        let mut inner = self.inner.write();
        match inner.by_title.get(title).copied() {
            Some(idx) => inner.rows[idx] = row,
            None => {
                let idx = inner.rows.len();
                inner.rows.push(row);
                inner.by_title.insert(title.to_string(), idx);
            }
        }
        true
    }

    /// Highest-similarity row at or above `threshold`; earliest row wins ties.
    pub fn best_match(&self, query: &[f32], threshold: f32) -> Option<SimilarityMatch> {
        if query.len() != self.dim {
            return None;
        }

        let inner = self.inner.read();
        let mut best: Option<(usize, f32)> = None;
        for (idx, row) in inner.rows.iter().enumerate() {
            let similarity = cosine_similarity_f16_f32(&row.embedding, query);
            if similarity >= threshold && best.is_none_or(|(_, s)| similarity > s) {
                best = Some((idx, similarity));
            }
        }

        best.map(|(idx, similarity)| {
            let row = &inner.rows[idx];
            SimilarityMatch {
                title: row.title.clone(),
                pair: row.pair.clone(),
                similarity,
            }
        })
    }

    /// Serializable copy of every row, in insertion order.
    pub fn to_snapshot(&self) -> SimilaritySnapshot {
        let inner = self.inner.read();
        SimilaritySnapshot {
            embedding_dim: self.dim as u32,
            written_at: chrono::Utc::now().timestamp(),
            records: inner
                .rows
                .iter()
                .map(|row| SimilarityRecord {
                    title: row.title.clone(),
                    category: row.pair.category.clone(),
                    subcategory: row.pair.subcategory.clone(),
                    embedding: bytemuck::cast_slice(&row.embedding).to_vec(),
                })
                .collect(),
        }
    }

    /// Rebuilds an index from a snapshot.
    ///
    /// Rows whose dimension differs from `dim` (a different embedding model) or
    /// whose pair is no longer in `taxonomy` are skipped.
    pub fn from_snapshot(snapshot: SimilaritySnapshot, dim: usize, taxonomy: &Taxonomy) -> Self {
        let index = Self::new(dim);
        let mut skipped = 0usize;
        for record in snapshot.records {
            let pair = taxonomy.canonical(&record.category, &record.subcategory);
            let embedding = bytes_to_f16_vec(&record.embedding);
            match pair {
                Some(pair) if embedding.len() == dim => {
                    let f32s: Vec<f32> = embedding.iter().map(|v| v.to_f32()).collect();
                    index.insert(&record.title, pair, &f32s);
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "Dropped incompatible similarity snapshot rows");
        }
        index
    }

    /// Writes the index to `path` atomically.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        write_snapshot(path, &self.to_snapshot())
    }

    /// Loads an index from `path`, or an empty one if the file is absent.
    pub fn load(path: &Path, dim: usize, taxonomy: &Taxonomy) -> StorageResult<Self> {
        match read_snapshot(path)? {
            Some(snapshot) => {
                let index = Self::from_snapshot(snapshot, dim, taxonomy);
                info!(path = %path.display(), rows = index.len(), "Similarity index loaded");
                Ok(index)
            }
            None => Ok(Self::new(dim)),
        }
    }
}

#[inline]
pub fn f32_to_f16_vec(v: &[f32]) -> Vec<f16> {
    v.iter().copied().map(f16::from_f32).collect()
}

/// Decodes little-endian f16 bytes regardless of the buffer's alignment.
#[inline]
pub fn bytes_to_f16_vec(bytes: &[u8]) -> Vec<f16> {
    if bytes.len() % 2 != 0 {
        return Vec::new();
    }
    bytes
        .chunks_exact(2)
        .map(|c| f16::from_le_bytes([c[0], c[1]]))
        .collect()
}

/// Cosine similarity; `0.0` for empty, mismatched or zero-norm inputs.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (&av, &bv)| {
            (dot + av * bv, na + av * av, nb + bv * bv)
        });

    let denom = norm_a_sq.sqrt() * norm_b_sq.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

/// Cosine similarity between a stored f16 vector and an f32 query.
#[inline]
pub fn cosine_similarity_f16_f32(stored: &[f16], query: &[f32]) -> f32 {
    if stored.len() != query.len() || stored.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) = stored.iter().zip(query.iter()).fold(
        (0.0f32, 0.0f32, 0.0f32),
        |(dot, na, nb), (av, &bv)| {
            let av = av.to_f32();
            (dot + av * bv, na + av * av, nb + bv * bv)
        },
    );

    let denom = norm_a_sq.sqrt() * norm_b_sq.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}
