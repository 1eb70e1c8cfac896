use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheHit, CacheTier};
use crate::confidence::ClusterAnalysis;
use crate::constants::{
    CORRECTED_CONFIDENCE, FALLBACK_CONFIDENCE, LOW_CONFIDENCE_THRESHOLD, VALIDATED_CONFIDENCE,
};
use crate::retry::{Resolution, ResolvedBy};
use crate::taxonomy::CategoryPair;

/// Where a title's label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    ExactCache,
    SimilarityCache,
    RuleBased,
    LlmApi,
    Fallback,
}

impl Method {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::ExactCache => "exact_cache",
            Method::SimilarityCache => "similarity_cache",
            Method::RuleBased => "rule_based",
            Method::LlmApi => "llm_api",
            Method::Fallback => "fallback",
        }
    }

    /// True for the three cache tiers.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(
            self,
            Method::ExactCache | Method::SimilarityCache | Method::RuleBased
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label and trust score for one input title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationResult {
    /// Normalized title.
    pub title: String,
    pub category: String,
    pub subcategory: String,
    pub method: Method,
    /// True when the pair was taken as-is, without correction or fallback.
    pub is_valid: bool,
    pub attempts_used: u32,
    pub confidence: f32,
    /// Density cluster the title fell into (`-1` = noise), once scored.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cluster_label: Option<i32>,
}

impl CategorizationResult {
    pub fn pair(&self) -> CategoryPair {
        CategoryPair::new(&self.category, &self.subcategory)
    }

    pub(crate) fn from_hit(title: String, hit: CacheHit) -> Self {
        let method = match hit.tier {
            CacheTier::Exact => Method::ExactCache,
            CacheTier::Similarity => Method::SimilarityCache,
            CacheTier::Rule | CacheTier::Miss => Method::RuleBased,
        };
        Self {
            title,
            category: hit.pair.category,
            subcategory: hit.pair.subcategory,
            method,
            is_valid: hit.is_valid,
            attempts_used: 1,
            confidence: hit.confidence.clamp(0.0, 1.0),
            cluster_label: None,
        }
    }

    pub(crate) fn from_resolution(title: String, resolution: Resolution) -> Self {
        let (method, confidence) = match (resolution.resolved_by, resolution.is_valid) {
            (ResolvedBy::Service, true) => (Method::LlmApi, VALIDATED_CONFIDENCE),
            (ResolvedBy::Service, false) => (Method::LlmApi, CORRECTED_CONFIDENCE),
            (ResolvedBy::Fallback, _) => (Method::Fallback, FALLBACK_CONFIDENCE),
        };
        Self {
            title,
            category: resolution.pair.category,
            subcategory: resolution.pair.subcategory,
            method,
            is_valid: resolution.is_valid,
            attempts_used: resolution.attempts.max(1),
            confidence,
            cluster_label: None,
        }
    }

    pub(crate) fn fallback(title: String, pair: CategoryPair) -> Self {
        Self {
            title,
            category: pair.category,
            subcategory: pair.subcategory,
            method: Method::Fallback,
            is_valid: false,
            attempts_used: 1,
            confidence: FALLBACK_CONFIDENCE,
            cluster_label: None,
        }
    }
}

/// Results of one `categorize` run, index-aligned with the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorizationRun {
    pub results: Vec<CategorizationResult>,
    /// Cluster composition, when the confidence pass ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ClusterAnalysis>,
}

impl CategorizationRun {
    /// Number of results per method.
    pub fn method_counts(&self) -> BTreeMap<Method, usize> {
        method_counts(&self.results)
    }

    /// Results whose pair was accepted without correction or fallback.
    pub fn valid_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_valid).count()
    }

    /// Number of results per `attempts_used` value.
    pub fn attempt_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.results {
            *counts.entry(r.attempts_used).or_insert(0) += 1;
        }
        counts
    }

    /// Results below [`LOW_CONFIDENCE_THRESHOLD`].
    pub fn low_confidence_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.confidence < LOW_CONFIDENCE_THRESHOLD)
            .count()
    }
}

pub fn method_counts(results: &[CategorizationResult]) -> BTreeMap<Method, usize> {
    let mut counts = BTreeMap::new();
    for r in results {
        *counts.entry(r.method).or_insert(0) += 1;
    }
    counts
}
