//! Catwise library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`Pipeline`], [`PipelineBuilder`] - Batch categorization entry point
//! - [`CategorizationResult`], [`Method`] - Per-title outcome
//! - [`Config`], [`ConfigError`], [`Tier`], [`TierConfig`] - Server and tier configuration
//! - [`CacheEntry`] - Storage format for cached pairs
//!
//! ## Lookup Tiers
//! - [`TieredCache`], [`ExactCache`], [`SimilarityIndex`] - Exact, similarity and rule tiers
//! - [`RuleTable`], [`FallbackTable`] - Keyword tables
//!
//! ## Dispatch & Validation
//! - [`RateLimiter`], [`ConcurrencyGate`], [`BatchScheduler`] - Call pacing
//! - [`TaxonomyValidator`], [`RetryOrchestrator`] - Reply parsing and retries
//!
//! ## Confidence
//! - [`ClusterConfidenceEstimator`] - Embedding clusters to confidence scores
//!
//! ## Test/Mock Support
//! Scripted providers and mock embedders are available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod confidence;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod embedding;
pub mod gateway;
pub mod hashing;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod retry;
pub mod storage;
pub mod taxonomy;

pub use cache::{ExactCache, SimilarityIndex, TieredCache, TieredCacheHandle, TieredLookup};
pub use confidence::{ClusterAnalysis, ClusterConfidenceEstimator, ConfidenceConfig};
pub use config::{Config, ConfigError, Tier, TierConfig};
pub use constants::{
    CATWISE_STATUS_HEADER, DEFAULT_SIMILARITY_THRESHOLD, FALLBACK_CONFIDENCE, UNKNOWN_PRODUCT,
};
pub use dispatch::{
    BatchScheduler, Clock, ConcurrencyGate, Dispatcher, ManualClock, Progress, ProgressCallback,
    RateLimiter, TokioClock,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use embedding::{EmbeddingError, MiniLmConfig, MiniLmEmbedder, TitleEmbedder};
pub use hashing::{fingerprint, fingerprint_raw, key_hash_hex};
pub use normalize::normalize_title;
pub use pipeline::{
    CategorizationResult, CategorizationRun, Method, Pipeline, PipelineBuilder, PipelineError,
};
#[cfg(any(test, feature = "mock"))]
pub use provider::{Reply, ScriptedProvider};
pub use provider::{
    CategorizationProvider, GenaiProvider, OfflineProvider, ProviderError, PromptTemplate,
};
pub use retry::{RetryOrchestrator, RetryPolicy};
pub use storage::{CacheEntry, CacheStore, MemoryCacheStore, NvmeCacheStore, StorageError};
pub use taxonomy::{CategoryPair, FallbackTable, RuleTable, Taxonomy, TaxonomyValidator};
