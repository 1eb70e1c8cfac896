//! Storage model types.

use rkyv::{Archive, Deserialize, Serialize};

use crate::taxonomy::CategoryPair;

/// One exact-cache row, keyed by the BLAKE3 fingerprint of the normalized title.
///
/// Stored as `rkyv` bytes and read back through a memory map.
///
/// # Example
/// ```rust
/// use catwise::CacheEntry;
///
/// let entry = CacheEntry::new("levi's 501 jeans", "Clothing", "Bottoms", 0.9);
/// assert_eq!(entry.key_hash, catwise::hashing::fingerprint("levi's 501 jeans"));
/// ```
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct CacheEntry {
    /// BLAKE3 digest of `title`.
    pub key_hash: [u8; 32],
    /// Normalized title.
    pub title: String,
    pub category: String,
    pub subcategory: String,
    /// Confidence at the time of categorization.
    pub confidence: f32,
    /// False when the pair was corrected from an off-taxonomy reply.
    pub is_valid: bool,
    /// Unix timestamp (seconds) when written.
    pub created_at: i64,
}

impl CacheEntry {
    /// Builds an entry for a normalized title, stamped with the current time.
    pub fn new(
        normalized_title: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
        confidence: f32,
    ) -> Self {
        let title = normalized_title.into();
        Self {
            key_hash: crate::hashing::fingerprint(&title),
            title,
            category: category.into(),
            subcategory: subcategory.into(),
            confidence,
            is_valid: true,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_validity(mut self, is_valid: bool) -> Self {
        self.is_valid = is_valid;
        self
    }

    pub fn pair(&self) -> CategoryPair {
        CategoryPair::new(&self.category, &self.subcategory)
    }

    /// Same payload as `other`, ignoring the timestamp.
    pub fn same_value(&self, other: &CacheEntry) -> bool {
        self.key_hash == other.key_hash
            && self.title == other.title
            && self.category == other.category
            && self.subcategory == other.subcategory
            && self.confidence.to_bits() == other.confidence.to_bits()
            && self.is_valid == other.is_valid
    }
}

/// One similarity-index row as persisted between runs.
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct SimilarityRecord {
    /// Normalized title.
    pub title: String,
    pub category: String,
    pub subcategory: String,
    /// Embedding as little-endian f16 bytes.
    pub embedding: Vec<u8>,
}

/// Full similarity index snapshot.
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
pub struct SimilaritySnapshot {
    /// Embedding dimension shared by every record.
    pub embedding_dim: u32,
    /// Unix timestamp (seconds) when written.
    pub written_at: i64,
    pub records: Vec<SimilarityRecord>,
}
