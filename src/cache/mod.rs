//! Exact, similarity and rule tiers consulted before any external call.

pub mod l1;
pub mod similarity;
pub mod tiered;
pub mod types;

#[cfg(test)]
mod similarity_tests;

pub use l1::ExactCache;
pub use similarity::{
    SimilarityIndex, SimilarityMatch, bytes_to_f16_vec, cosine_similarity,
    cosine_similarity_f16_f32, f32_to_f16_vec,
};
pub use tiered::{TieredCache, TieredCacheHandle};
pub use types::{CacheHit, CacheTier, TieredLookup};
