use crate::taxonomy::CategoryPair;

/// Which tier answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    Exact,
    Similarity,
    Rule,
    Miss,
}

impl CacheTier {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::Exact => "exact",
            CacheTier::Similarity => "similarity",
            CacheTier::Rule => "rule",
            CacheTier::Miss => "miss",
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        !matches!(self, CacheTier::Miss)
    }
}

impl std::fmt::Display for CacheTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tier hit, before it is turned into a categorization result.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    pub pair: CategoryPair,
    pub tier: CacheTier,
    pub confidence: f32,
    /// False when replaying a corrected service answer.
    pub is_valid: bool,
    /// Cosine similarity of the matched neighbour (similarity tier only).
    pub similarity: Option<f32>,
}

/// Outcome of a [`super::TieredCache::lookup`].
#[derive(Debug, Clone)]
pub enum TieredLookup {
    Hit(CacheHit),
    /// Nothing matched. Carries the title embedding when one was computed, so
    /// the caller can index the eventual service result without re-embedding.
    Miss { embedding: Option<Vec<f32>> },
}

impl TieredLookup {
    #[inline]
    pub fn tier(&self) -> CacheTier {
        match self {
            TieredLookup::Hit(hit) => hit.tier,
            TieredLookup::Miss { .. } => CacheTier::Miss,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.tier().is_hit()
    }

    pub fn into_hit(self) -> Option<CacheHit> {
        match self {
            TieredLookup::Hit(hit) => Some(hit),
            TieredLookup::Miss { .. } => None,
        }
    }
}
