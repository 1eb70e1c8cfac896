//! Composition root: normalize, look up, dispatch, validate, score.
//!
//! [`Pipeline::categorize`] never fails. Per-title failures become fallback
//! results, and a failed confidence pass leaves the initial confidences in
//! place. Results are reassembled by input index regardless of completion
//! order.

mod error;
mod result;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

pub use error::{PipelineError, PipelineResult};
pub use result::{CategorizationResult, CategorizationRun, Method, method_counts};

use crate::cache::{ExactCache, SimilarityIndex, TieredCache, TieredCacheHandle, TieredLookup};
use crate::confidence::{ClusterAnalysis, ClusterConfidenceEstimator, ConfidenceConfig};
use crate::config::TierConfig;
use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_SIMILARITY_THRESHOLD};
use crate::dispatch::{BatchScheduler, Clock, Dispatcher, Progress, ProgressCallback, TokioClock};
use crate::embedding::TitleEmbedder;
use crate::normalize::normalize_title;
use crate::provider::CategorizationProvider;
use crate::retry::{RetryOrchestrator, RetryPolicy};
use crate::storage::{CacheStore, MemoryCacheStore, StorageResult};
use crate::taxonomy::{RuleTable, Taxonomy, TaxonomyValidator};

/// Assembles a [`Pipeline`] from its collaborators.
///
/// Only the provider is required. Everything else defaults to the standard
/// taxonomy tables, an in-memory store and no embedder (which disables the
/// similarity tier and the confidence pass).
pub struct PipelineBuilder {
    taxonomy: Arc<Taxonomy>,
    rules: Option<RuleTable>,
    validator: Option<Arc<TaxonomyValidator>>,
    store: Option<Arc<dyn CacheStore>>,
    exact_capacity: u64,
    embedder: Option<Arc<dyn TitleEmbedder>>,
    similarity: Option<Arc<SimilarityIndex>>,
    threshold: f32,
    provider: Option<Arc<dyn CategorizationProvider>>,
    retry: RetryPolicy,
    confidence: Option<ConfidenceConfig>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            taxonomy: Arc::new(Taxonomy::standard()),
            rules: None,
            validator: None,
            store: None,
            exact_capacity: 10_000,
            embedder: None,
            similarity: None,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            provider: None,
            retry: RetryPolicy::default(),
            confidence: Some(ConfidenceConfig::default()),
        }
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn taxonomy(mut self, taxonomy: Arc<Taxonomy>) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    pub fn rules(mut self, rules: RuleTable) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn validator(mut self, validator: Arc<TaxonomyValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn exact_capacity(mut self, capacity: u64) -> Self {
        self.exact_capacity = capacity;
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn TitleEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Starts from an existing index, e.g. one loaded from a snapshot.
    pub fn similarity_index(mut self, index: Arc<SimilarityIndex>) -> Self {
        self.similarity = Some(index);
        self
    }

    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn CategorizationProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn confidence(mut self, config: ConfidenceConfig) -> Self {
        self.confidence = Some(config);
        self
    }

    /// Skips the cluster pass; results keep their initial confidences.
    pub fn without_confidence(mut self) -> Self {
        self.confidence = None;
        self
    }

    pub fn build(self) -> PipelineResult<Pipeline> {
        self.build_with_clock(Arc::new(TokioClock))
    }

    /// Builds a pipeline whose rate limiters read time from `clock`.
    pub fn build_with_clock<C: Clock>(self, clock: Arc<C>) -> PipelineResult<Pipeline<C>> {
        let provider = self.provider.ok_or(PipelineError::MissingProvider)?;
        let rules = match self.rules {
            Some(rules) => rules,
            None => RuleTable::standard(&self.taxonomy)?,
        };
        let validator = match self.validator {
            Some(validator) => validator,
            None => Arc::new(TaxonomyValidator::standard(self.taxonomy.clone())?),
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryCacheStore::new()));

        let dim = self
            .embedder
            .as_ref()
            .map_or(DEFAULT_EMBEDDING_DIM, |e| e.embedding_dim());
        let similarity = self
            .similarity
            .unwrap_or_else(|| Arc::new(SimilarityIndex::new(dim)));

        let cache = TieredCache::new(
            ExactCache::new(store, self.exact_capacity),
            similarity,
            self.embedder.clone(),
            rules,
            self.taxonomy,
        )
        .with_threshold(self.threshold);

        let estimator = match (self.confidence, self.embedder) {
            (Some(config), Some(embedder)) => {
                Some(Arc::new(ClusterConfidenceEstimator::new(embedder, config)))
            }
            _ => None,
        };

        Ok(Pipeline {
            cache: Arc::new(cache),
            orchestrator: Arc::new(RetryOrchestrator::new(provider, validator, self.retry)),
            estimator,
            clock,
            dispatchers: Mutex::new(HashMap::new()),
        })
    }
}

/// Batch categorizer over a shared tiered cache.
///
/// Runs with the same [`TierConfig`] share one dispatcher, so concurrent runs
/// together stay under that tier's rate and concurrency ceilings.
pub struct Pipeline<C: Clock = TokioClock> {
    cache: TieredCacheHandle,
    orchestrator: Arc<RetryOrchestrator>,
    estimator: Option<Arc<ClusterConfidenceEstimator>>,
    clock: Arc<C>,
    dispatchers: Mutex<HashMap<TierConfig, Arc<Dispatcher<C>>>>,
}

impl<C: Clock> std::fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("cache", &self.cache)
            .field("orchestrator", &self.orchestrator)
            .field("confidence_pass", &self.estimator.is_some())
            .finish()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }
}

impl<C: Clock> Pipeline<C> {
    #[inline]
    pub fn cache(&self) -> &TieredCacheHandle {
        &self.cache
    }

    #[inline]
    pub fn orchestrator(&self) -> &Arc<RetryOrchestrator> {
        &self.orchestrator
    }

    /// True when results get cluster-derived confidences.
    #[inline]
    pub fn scores_confidence(&self) -> bool {
        self.estimator.is_some()
    }

    /// Dispatcher shared by every run using `tier`.
    pub fn dispatcher(&self, tier: &TierConfig) -> Arc<Dispatcher<C>> {
        self.dispatchers
            .lock()
            .entry(*tier)
            .or_insert_with(|| Arc::new(Dispatcher::with_clock(tier, self.clock.clone())))
            .clone()
    }

    /// Categorizes `titles`; `result[i]` always answers `titles[i]`.
    pub async fn categorize(
        &self,
        titles: &[Option<String>],
        tier: TierConfig,
        progress: Option<ProgressCallback>,
    ) -> Vec<CategorizationResult> {
        self.run(titles, tier, progress).await.results
    }

    /// Like [`Pipeline::categorize`], also returning the cluster analysis.
    #[instrument(skip_all, fields(titles = titles.len(), rpm = tier.requests_per_minute))]
    pub async fn run(
        &self,
        titles: &[Option<String>],
        tier: TierConfig,
        progress: Option<ProgressCallback>,
    ) -> CategorizationRun {
        let normalized: Vec<String> = titles
            .iter()
            .map(|t| normalize_title(t.as_deref()))
            .collect();
        let total = normalized.len();
        if total == 0 {
            if let Some(report) = &progress {
                report(Progress::new(0, 0));
            }
            return CategorizationRun::default();
        }

        let dispatcher = self.dispatcher(&tier);
        let scheduler = BatchScheduler::from(&tier);
        let mut results = Vec::with_capacity(total);

        for batch in scheduler.batches(total) {
            let batch_titles = &normalized[batch.clone()];
            let handles = batch_titles.iter().map(|title| {
                tokio::spawn(resolve_title(
                    self.cache.clone(),
                    self.orchestrator.clone(),
                    dispatcher.clone(),
                    title.clone(),
                ))
            });
            let joined = join_all(handles).await;

            for (title, joined) in batch_titles.iter().zip(joined) {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(title = %title, error = %e, "Categorization task failed; using fallback");
                        CategorizationResult::fallback(
                            title.clone(),
                            self.orchestrator.validator().fallback(title),
                        )
                    }
                };
                results.push(result);
            }

            info!(processed = batch.end, total, "Batch complete");
            if let Some(report) = &progress {
                report(Progress::new(batch.end, total));
            }
            scheduler.pause_after(&batch, total).await;
        }

        let analysis = match &self.estimator {
            Some(estimator) => score_confidence(estimator.clone(), &mut results).await,
            None => None,
        };

        CategorizationRun { results, analysis }
    }

    /// Writes the similarity index to `path`.
    pub fn save_similarity(&self, path: &Path) -> StorageResult<()> {
        self.cache.similarity().save(path)
    }
}

/// One title through the cache tiers and, on a miss, the retry driver.
async fn resolve_title<C: Clock>(
    cache: TieredCacheHandle,
    orchestrator: Arc<RetryOrchestrator>,
    dispatcher: Arc<Dispatcher<C>>,
    title: String,
) -> CategorizationResult {
    let lookup = {
        let cache = cache.clone();
        let title = title.clone();
        tokio::task::spawn_blocking(move || cache.lookup(&title)).await
    };

    let embedding = match lookup {
        Ok(TieredLookup::Hit(hit)) => {
            debug!(title = %title, tier = hit.tier.as_str(), "Resolved from cache");
            return CategorizationResult::from_hit(title, hit);
        }
        Ok(TieredLookup::Miss { embedding }) => embedding,
        Err(e) => {
            warn!(title = %title, error = %e, "Cache lookup task failed; treating as miss");
            None
        }
    };

    let resolution = orchestrator.resolve(&title, &dispatcher).await;
    let result = CategorizationResult::from_resolution(title, resolution);

    // Fallback answers are never cached; they would pin a guess.
    if result.method == Method::LlmApi {
        let pair = result.pair();
        let confidence = result.confidence;
        let is_valid = result.is_valid;
        let title = result.title.clone();
        let write = tokio::task::spawn_blocking(move || {
            cache.record_service_result(&title, &pair, confidence, is_valid, embedding)
        })
        .await;
        if let Err(e) = write {
            warn!(title = %result.title, error = %e, "Cache write task failed");
        }
    }
    result
}

/// Runs the cluster pass off the async workers and folds it into `results`.
async fn score_confidence(
    estimator: Arc<ClusterConfidenceEstimator>,
    results: &mut [CategorizationResult],
) -> Option<ClusterAnalysis> {
    let titles: Vec<String> = results.iter().map(|r| r.title.clone()).collect();
    let pairs: Vec<_> = results.iter().map(CategorizationResult::pair).collect();
    let base: Vec<f32> = results.iter().map(|r| r.confidence).collect();

    let report =
        tokio::task::spawn_blocking(move || estimator.estimate(&titles, &pairs, &base)).await;

    match report {
        Ok(Ok(report)) => {
            for (result, (&label, &confidence)) in results
                .iter_mut()
                .zip(report.labels.iter().zip(&report.confidences))
            {
                result.cluster_label = Some(label);
                result.confidence = confidence.clamp(0.0, 1.0);
            }
            Some(report.analysis)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Confidence pass failed; keeping initial confidences");
            None
        }
        Err(e) => {
            warn!(error = %e, "Confidence task failed; keeping initial confidences");
            None
        }
    }
}
