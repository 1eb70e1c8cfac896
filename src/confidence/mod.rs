//! Cluster-derived confidence.
//!
//! Runs once over a whole batch after categorization: embed every title,
//! reduce with [`manifold`], cluster with [`hdbscan`], then score each title by
//! how well its cluster agrees with its labels. The score never changes a
//! category; it only revises the confidence attached to it.

mod error;
pub mod hdbscan;
pub mod manifold;
pub mod scoring;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{info, instrument};

pub use error::{ConfidenceError, ConfidenceResult};
pub use hdbscan::{HdbscanConfig, NOISE};
pub use manifold::{ManifoldConfig, ManifoldReducer};
pub use scoring::{ClusterAnalysis, ClusterSummary, ScoringWeights};

use crate::embedding::TitleEmbedder;
use crate::taxonomy::CategoryPair;

/// Titles embedded per backend call.
const EMBED_CHUNK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceConfig {
    pub manifold: ManifoldConfig,
    pub hdbscan: HdbscanConfig,
    pub weights: ScoringWeights,
    /// Blend the cluster score with each title's initial confidence.
    pub blend_with_base: bool,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            manifold: ManifoldConfig::default(),
            hdbscan: HdbscanConfig::default(),
            weights: ScoringWeights::default(),
            blend_with_base: true,
        }
    }
}

/// Output of one confidence pass; vectors are index-aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfidenceReport {
    pub labels: Vec<i32>,
    pub cluster_scores: Vec<f32>,
    pub confidences: Vec<f32>,
    pub analysis: ClusterAnalysis,
}

/// Scores a batch of categorized titles by cluster consistency.
pub struct ClusterConfidenceEstimator {
    embedder: Arc<dyn TitleEmbedder>,
    reducer: ManifoldReducer,
    config: ConfidenceConfig,
}

impl std::fmt::Debug for ClusterConfidenceEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConfidenceEstimator")
            .field("embedding_dim", &self.embedder.embedding_dim())
            .field("config", &self.config)
            .finish()
    }
}

impl ClusterConfidenceEstimator {
    pub fn new(embedder: Arc<dyn TitleEmbedder>, config: ConfidenceConfig) -> Self {
        Self {
            embedder,
            reducer: ManifoldReducer::new(config.manifold),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &ConfidenceConfig {
        &self.config
    }

    /// Embeds, clusters and scores `titles` against their assigned `pairs`.
    ///
    /// `base` carries each title's initial confidence for blending.
    #[instrument(skip_all, fields(titles = titles.len()))]
    pub fn estimate(
        &self,
        titles: &[String],
        pairs: &[CategoryPair],
        base: &[f32],
    ) -> ConfidenceResult<ConfidenceReport> {
        if titles.len() != pairs.len() || titles.len() != base.len() {
            return Err(ConfidenceError::LengthMismatch {
                titles: titles.len(),
                labels: pairs.len(),
                base: base.len(),
            });
        }
        if titles.is_empty() {
            return Ok(ConfidenceReport::default());
        }

        let embeddings = self.embed_all(titles)?;
        Ok(self.score_embeddings(&embeddings, titles, pairs, base))
    }

    /// Embeds titles in chunks, checking every vector has the same dimension.
    pub fn embed_all(&self, titles: &[String]) -> ConfidenceResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(titles.len());
        for chunk in titles.chunks(EMBED_CHUNK) {
            let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let vectors = self.embedder.embed_batch(&refs)?;
            if vectors.len() != refs.len() {
                return Err(crate::embedding::EmbeddingError::CountMismatch {
                    expected: refs.len(),
                    actual: vectors.len(),
                }
                .into());
            }
            out.extend(vectors);
        }

        let expected = out.first().map_or(0, Vec::len);
        if let Some((index, v)) = out.iter().enumerate().find(|(_, v)| v.len() != expected) {
            return Err(ConfidenceError::RaggedEmbeddings {
                index,
                expected,
                actual: v.len(),
            });
        }
        Ok(out)
    }

    /// Reduction, clustering and scoring over precomputed embeddings.
    pub fn score_embeddings(
        &self,
        embeddings: &[Vec<f32>],
        titles: &[String],
        pairs: &[CategoryPair],
        base: &[f32],
    ) -> ConfidenceReport {
        let reduced = self.reducer.fit_transform(embeddings);
        let labels = hdbscan::cluster(&reduced, &self.config.hdbscan);
        let weights = &self.config.weights;
        let cluster_scores = scoring::cluster_scores(&labels, pairs, weights);

        let confidences = if self.config.blend_with_base {
            base.iter()
                .zip(&cluster_scores)
                .map(|(&b, &c)| scoring::blend(b, c, weights))
                .collect()
        } else {
            cluster_scores.clone()
        };

        let analysis = ClusterAnalysis::from_labels(&labels, titles, pairs);
        info!(
            clusters = analysis.cluster_count(),
            noise = analysis.noise,
            "Cluster confidence pass complete"
        );

        ConfidenceReport {
            labels,
            cluster_scores,
            confidences,
            analysis,
        }
    }
}
