//! Extraction of (category, subcategory) candidates from service responses.
//!
//! Nothing here checks the taxonomy; see [`super::TaxonomyValidator`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Lead-ins the model sometimes prepends, stripped in this order.
const PREFIXES: &[&str] = &[
    "category:",
    "category ",
    "answer:",
    "result:",
    "the category is",
    "this product is",
    "product:",
];

/// Separator patterns in priority order.
///
/// Names may carry an apostrophe ("Men's Grooming").
static SEPARATOR_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"([A-Za-z\s&']+)\|([A-Za-z\s&']+)",
        r"([A-Za-z\s&']+):\s*([A-Za-z\s&']+)",
        r"([A-Za-z\s&']+)\s*-\s*([A-Za-z\s&']+)",
        r"([A-Za-z\s&']+)\s*>\s*([A-Za-z\s&']+)",
    ]
    .map(|p| Regex::new(p).expect("separator pattern is valid"))
});

/// Raw category/subcategory strings pulled out of a response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawPair {
    pub category: String,
    pub subcategory: String,
}

/// Parses the structured-output shape `{"category": .., "subcategory": ..}`.
pub fn parse_structured(text: &str) -> Option<RawPair> {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str::<RawPair>(trimmed).ok()
}

/// Trims whitespace and strips known lead-ins (case-insensitive).
pub fn strip_prefixes(text: &str) -> &str {
    let mut cleaned = text.trim();
    for prefix in PREFIXES {
        let len = prefix.len();
        if cleaned.len() >= len
            && cleaned.is_char_boundary(len)
            && cleaned[..len].eq_ignore_ascii_case(prefix)
        {
            cleaned = cleaned[len..].trim();
        }
    }
    cleaned
}

/// One candidate per separator pattern that matches, in priority order.
///
/// Each candidate is the leftmost match of its pattern, with both sides trimmed.
pub fn separator_candidates(text: &str) -> Vec<RawPair> {
    SEPARATOR_PATTERNS
        .iter()
        .filter_map(|pattern| {
            let caps = pattern.captures(text)?;
            let category = caps.get(1)?.as_str().trim();
            let subcategory = caps.get(2)?.as_str().trim();
            if category.is_empty() {
                return None;
            }
            Some(RawPair {
                category: category.to_string(),
                subcategory: subcategory.to_string(),
            })
        })
        .collect()
}
