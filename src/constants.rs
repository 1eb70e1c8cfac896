//! Cross-cutting, shared constants.
//!
//! Values here are defaults. The tunable ones (thresholds, multipliers, tier
//! limits) are carried through config structs so callers can override them.

/// Normalized form of an absent title.
pub const UNKNOWN_PRODUCT: &str = "unknown product";

/// Output dimension of the MiniLM sentence embedder.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Max tokens fed to the sentence embedder per title.
pub const DEFAULT_MAX_SEQ_LEN: usize = 128;

/// Cosine similarity needed for a similarity-cache hit.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.85;

/// Confidence attached to a similarity-cache hit.
pub const SIMILARITY_HIT_CONFIDENCE: f32 = 0.8;

/// Confidence attached to a rule-table hit.
pub const RULE_HIT_CONFIDENCE: f32 = 0.6;

/// Confidence of a service response that matched the taxonomy as-is.
pub const VALIDATED_CONFIDENCE: f32 = 0.9;

/// Confidence of a service response that needed correction.
pub const CORRECTED_CONFIDENCE: f32 = 0.6;

/// Confidence of a keyword-fallback result.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Results scoring below this are counted as low confidence.
pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Attempts per title against the external service.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Length of the sliding rate window.
pub const RATE_WINDOW_SECS: u64 = 60;

/// Extra wait added when the rate window is full.
pub const RATE_WINDOW_EPSILON_MS: u64 = 100;

/// Status header attached to gateway responses.
pub const CATWISE_STATUS_HEADER: &str = "X-Catwise-Status";
pub const CATWISE_STATUS_HEALTHY: &str = "healthy";
pub const CATWISE_STATUS_READY: &str = "ready";
pub const CATWISE_STATUS_ERROR: &str = "error";
pub const CATWISE_STATUS_CATEGORIZED: &str = "categorized";
