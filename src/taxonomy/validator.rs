//! Parse, validate and correct service responses against the taxonomy.
//!
//! Correction is a fixed cascade, first hit wins:
//! category: exact → containment → keyword table;
//! subcategory: exact → containment → the category's first subcategory.

use std::sync::Arc;

use tracing::debug;

use super::error::TaxonomyResult;
use super::parse::{parse_structured, separator_candidates, strip_prefixes};
use super::rules::{CategoryKeywords, FallbackTable};
use super::{CategoryDef, CategoryPair, Taxonomy};

/// Result of checking one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The response named a taxonomy pair as-is.
    Valid(CategoryPair),
    /// The response was usable after correction.
    Corrected(CategoryPair),
    /// Nothing usable; carries the keyword-fallback pair for the title.
    Fallback(CategoryPair),
}

impl Outcome {
    #[inline]
    pub fn pair(&self) -> &CategoryPair {
        match self {
            Outcome::Valid(p) | Outcome::Corrected(p) | Outcome::Fallback(p) => p,
        }
    }

    #[inline]
    pub fn into_pair(self) -> CategoryPair {
        match self {
            Outcome::Valid(p) | Outcome::Corrected(p) | Outcome::Fallback(p) => p,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid(_))
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Valid(_) => "valid",
            Outcome::Corrected(_) => "corrected",
            Outcome::Fallback(_) => "fallback",
        }
    }
}

/// Checks responses against a [`Taxonomy`] and corrects near-misses.
#[derive(Debug, Clone)]
pub struct TaxonomyValidator {
    taxonomy: Arc<Taxonomy>,
    keywords: CategoryKeywords,
    fallback: FallbackTable,
}

impl TaxonomyValidator {
    pub fn new(taxonomy: Arc<Taxonomy>, keywords: CategoryKeywords, fallback: FallbackTable) -> Self {
        Self {
            taxonomy,
            keywords,
            fallback,
        }
    }

    /// Validator with the built-in keyword and fallback tables.
    pub fn standard(taxonomy: Arc<Taxonomy>) -> TaxonomyResult<Self> {
        let keywords = CategoryKeywords::standard(&taxonomy);
        let fallback = FallbackTable::standard(&taxonomy)?;
        Ok(Self::new(taxonomy, keywords, fallback))
    }

    #[inline]
    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    /// Turns a raw response for `normalized_title` into an [`Outcome`].
    pub fn validate(&self, response: &str, normalized_title: &str) -> Outcome {
        let text = response.trim();
        if text.is_empty() {
            return Outcome::Fallback(self.fallback(normalized_title));
        }

        if let Some(raw) = parse_structured(text)
            && let Some(outcome) = self.correct(&raw.category, &raw.subcategory)
        {
            return outcome;
        }

        let cleaned = strip_prefixes(text);
        for raw in separator_candidates(cleaned) {
            if let Some(outcome) = self.correct(&raw.category, &raw.subcategory) {
                if !outcome.is_valid() {
                    debug!(
                        response = %text,
                        corrected = %outcome.pair(),
                        "Corrected service response"
                    );
                }
                return outcome;
            }
        }

        if let Some(def) = self.mentioned_category(cleaned) {
            debug!(response = %text, category = def.name(), "Recovered bare category mention");
            return Outcome::Corrected(CategoryPair::new(def.name(), def.default_subcategory()));
        }

        debug!(response = %text, "Unusable service response");
        Outcome::Fallback(self.fallback(normalized_title))
    }

    /// Maps a raw pair into the taxonomy, or `None` if the category is unrecognizable.
    ///
    /// Returns [`Outcome::Valid`] only when both names matched exactly.
    pub fn correct(&self, category: &str, subcategory: &str) -> Option<Outcome> {
        let (def, category_exact) = self.closest_category(category)?;
        let (sub, subcategory_exact) = closest_subcategory(def, subcategory);
        let pair = CategoryPair::new(def.name(), sub);
        if category_exact && subcategory_exact {
            Some(Outcome::Valid(pair))
        } else {
            Some(Outcome::Corrected(pair))
        }
    }

    /// Category for a raw name plus whether it matched exactly.
    pub fn closest_category(&self, raw: &str) -> Option<(&CategoryDef, bool)> {
        if let Some(def) = self.taxonomy.category(raw) {
            return Some((def, true));
        }

        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }

        let contained = self.taxonomy.categories().find(|def| {
            let name = def.name().to_lowercase();
            lowered.contains(&name) || name.contains(&lowered)
        });
        if let Some(def) = contained {
            return Some((def, false));
        }

        self.keywords
            .category_for(&lowered)
            .and_then(|name| self.taxonomy.category(name))
            .map(|def| (def, false))
    }

    /// First category whose name appears anywhere in `text`.
    pub fn mentioned_category(&self, text: &str) -> Option<&CategoryDef> {
        let lowered = text.to_lowercase();
        self.taxonomy
            .categories()
            .find(|def| lowered.contains(&def.name().to_lowercase()))
    }

    /// Keyword fallback pair for a normalized title.
    pub fn fallback(&self, normalized_title: &str) -> CategoryPair {
        self.fallback.classify(normalized_title).clone()
    }
}

/// Subcategory within `def` for a raw name plus whether it matched exactly.
pub fn closest_subcategory<'a>(def: &'a CategoryDef, raw: &str) -> (&'a str, bool) {
    if let Some(sub) = def.subcategory(raw) {
        return (sub, true);
    }

    let lowered = raw.trim().to_lowercase();
    if !lowered.is_empty() {
        let contained = def.subcategories().iter().find(|s| {
            let name = s.to_lowercase();
            lowered.contains(&name) || name.contains(&lowered)
        });
        if let Some(sub) = contained {
            return (sub.as_str(), false);
        }
    }

    (def.default_subcategory(), false)
}
