//! Tiered cache: exact → similarity → rule.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::{CacheHit, CacheTier, ExactCache, SimilarityIndex, TieredLookup};
use crate::constants::{DEFAULT_SIMILARITY_THRESHOLD, RULE_HIT_CONFIDENCE, SIMILARITY_HIT_CONFIDENCE};
use crate::embedding::TitleEmbedder;
use crate::storage::CacheEntry;
use crate::taxonomy::{CategoryPair, RuleTable, Taxonomy};

/// Cheap-to-expensive lookup chain consulted before any external call.
///
/// Similarity and rule hits are written back into the exact cache so the next
/// lookup of the same normalized title short-circuits at the first tier.
pub struct TieredCache {
    exact: ExactCache,
    similarity: Arc<SimilarityIndex>,
    embedder: Option<Arc<dyn TitleEmbedder>>,
    rules: RuleTable,
    taxonomy: Arc<Taxonomy>,
    threshold: f32,
}

impl std::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("exact", &self.exact)
            .field("similarity_rows", &self.similarity.len())
            .field("has_embedder", &self.embedder.is_some())
            .field("rules", &self.rules.len())
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Shared handle used by concurrent categorization tasks.
pub type TieredCacheHandle = Arc<TieredCache>;

impl TieredCache {
    pub fn new(
        exact: ExactCache,
        similarity: Arc<SimilarityIndex>,
        embedder: Option<Arc<dyn TitleEmbedder>>,
        rules: RuleTable,
        taxonomy: Arc<Taxonomy>,
    ) -> Self {
        Self {
            exact,
            similarity,
            embedder,
            rules,
            taxonomy,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Sets the minimum cosine similarity for a similarity-tier hit.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[inline]
    pub fn exact(&self) -> &ExactCache {
        &self.exact
    }

    #[inline]
    pub fn similarity(&self) -> &Arc<SimilarityIndex> {
        &self.similarity
    }

    #[inline]
    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    /// Runs the three tiers in order for a normalized title.
    ///
    /// Embedding failures skip the similarity tier; they never fail the lookup.
    #[instrument(skip(self), fields(tier = tracing::field::Empty))]
    pub fn lookup(&self, normalized: &str) -> TieredLookup {
        if let Some(hit) = self.lookup_exact(normalized) {
            tracing::Span::current().record("tier", CacheTier::Exact.as_str());
            return TieredLookup::Hit(hit);
        }

        let embedding = self.embed(normalized);
        if let Some(query) = embedding.as_deref()
            && !self.similarity.is_empty()
            && let Some(found) = self.similarity.best_match(query, self.threshold)
        {
            debug!(
                neighbour = %found.title,
                similarity = found.similarity,
                "Similarity cache hit"
            );
            tracing::Span::current().record("tier", CacheTier::Similarity.as_str());
            self.store_exact(normalized, &found.pair, SIMILARITY_HIT_CONFIDENCE);
            return TieredLookup::Hit(CacheHit {
                pair: found.pair,
                tier: CacheTier::Similarity,
                confidence: SIMILARITY_HIT_CONFIDENCE,
                is_valid: true,
                similarity: Some(found.similarity),
            });
        }

        if let Some(pair) = self.rules.classify(normalized).cloned() {
            tracing::Span::current().record("tier", CacheTier::Rule.as_str());
            self.store_exact(normalized, &pair, RULE_HIT_CONFIDENCE);
            return TieredLookup::Hit(CacheHit {
                pair,
                tier: CacheTier::Rule,
                confidence: RULE_HIT_CONFIDENCE,
                is_valid: true,
                similarity: None,
            });
        }

        tracing::Span::current().record("tier", CacheTier::Miss.as_str());
        TieredLookup::Miss { embedding }
    }

    /// Exact tier only. Entries whose pair left the taxonomy read as a miss.
    pub fn lookup_exact(&self, normalized: &str) -> Option<CacheHit> {
        let entry = self.exact.lookup(normalized)?;
        match self.taxonomy.canonical(&entry.category, &entry.subcategory) {
            Some(pair) => Some(CacheHit {
                pair,
                tier: CacheTier::Exact,
                confidence: entry.confidence,
                is_valid: entry.is_valid,
                similarity: None,
            }),
            None => {
                warn!(
                    title = normalized,
                    category = %entry.category,
                    subcategory = %entry.subcategory,
                    "Cached pair not in taxonomy; ignoring entry"
                );
                None
            }
        }
    }

    /// Writes a taxonomy-valid result to the exact tier.
    pub fn store_exact(&self, normalized: &str, pair: &CategoryPair, confidence: f32) -> bool {
        self.store_exact_with_validity(normalized, pair, confidence, true)
    }

    fn store_exact_with_validity(
        &self,
        normalized: &str,
        pair: &CategoryPair,
        confidence: f32,
        is_valid: bool,
    ) -> bool {
        self.exact.insert(
            CacheEntry::new(normalized, &pair.category, &pair.subcategory, confidence)
                .with_validity(is_valid),
        )
    }

    /// Adds a title to the similarity index, embedding it if `embedding` is `None`.
    pub fn index_similarity(
        &self,
        normalized: &str,
        pair: &CategoryPair,
        embedding: Option<Vec<f32>>,
    ) -> bool {
        let embedding = match embedding {
            Some(v) => Some(v),
            None => self.embed(normalized),
        };
        match embedding {
            Some(v) => self.similarity.insert(normalized, pair.clone(), &v),
            None => false,
        }
    }

    /// Records an external-service result in both tiers.
    ///
    /// `is_valid` is kept on the exact entry so a replayed corrected answer
    /// still reports the correction.
    pub fn record_service_result(
        &self,
        normalized: &str,
        pair: &CategoryPair,
        confidence: f32,
        is_valid: bool,
        embedding: Option<Vec<f32>>,
    ) {
        self.store_exact_with_validity(normalized, pair, confidence, is_valid);
        self.index_similarity(normalized, pair, embedding);
    }

    fn embed(&self, normalized: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        match embedder.embed(normalized) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(title = normalized, error = %e, "Embedding failed; skipping similarity tier");
                None
            }
        }
    }
}
