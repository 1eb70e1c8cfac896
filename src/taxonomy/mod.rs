//! Closed category taxonomy and everything that checks output against it.
//!
//! - [`Taxonomy`] is the fixed category → subcategory mapping.
//! - [`RuleTable`] / [`FallbackTable`] map title keywords to taxonomy pairs.
//! - [`TaxonomyValidator`] turns raw service responses into an [`Outcome`].

mod catalog;
pub mod error;
pub mod parse;
pub mod rules;
pub mod validator;

#[cfg(test)]
mod tests;

pub use error::{TaxonomyError, TaxonomyResult};
pub use rules::{CategoryKeywords, FallbackTable, KeywordRule, RuleTable};
pub use validator::{Outcome, TaxonomyValidator};

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A (category, subcategory) label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryPair {
    pub category: String,
    pub subcategory: String,
}

impl CategoryPair {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }
}

impl fmt::Display for CategoryPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.category, self.subcategory)
    }
}

/// One category and its ordered subcategories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDef {
    name: String,
    subcategories: Vec<String>,
}

impl CategoryDef {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn subcategories(&self) -> &[String] {
        &self.subcategories
    }

    /// First listed subcategory, used when nothing better matches.
    #[inline]
    pub fn default_subcategory(&self) -> &str {
        // Construction rejects categories without subcategories.
        self.subcategories.first().map(String::as_str).unwrap_or_default()
    }

    /// Case-insensitive exact subcategory lookup, returning the canonical name.
    pub fn subcategory(&self, name: &str) -> Option<&str> {
        let needle = name.trim();
        self.subcategories
            .iter()
            .find(|s| s.eq_ignore_ascii_case(needle))
            .map(String::as_str)
    }
}

/// Fixed mapping from category name to its valid subcategories.
///
/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<CategoryDef>,
    by_lower: HashMap<String, usize>,
}

impl Taxonomy {
    /// Builds a taxonomy, rejecting empty or duplicated entries.
    pub fn new<C, S>(entries: impl IntoIterator<Item = (C, Vec<S>)>) -> TaxonomyResult<Self>
    where
        C: Into<String>,
        S: Into<String>,
    {
        let mut categories = Vec::new();
        let mut by_lower = HashMap::new();

        for (name, subs) in entries {
            let name: String = name.into();
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(TaxonomyError::EmptyName);
            }

            let subcategories: Vec<String> = subs
                .into_iter()
                .map(|s| {
                    let s: String = s.into();
                    s.trim().to_string()
                })
                .collect();
            if subcategories.is_empty() {
                return Err(TaxonomyError::NoSubcategories { category: name });
            }
            if subcategories.iter().any(String::is_empty) {
                return Err(TaxonomyError::EmptyName);
            }

            let key = name.to_lowercase();
            if by_lower.contains_key(&key) {
                return Err(TaxonomyError::DuplicateCategory { category: name });
            }
            by_lower.insert(key, categories.len());
            categories.push(CategoryDef {
                name,
                subcategories,
            });
        }

        if categories.is_empty() {
            return Err(TaxonomyError::Empty);
        }

        Ok(Self {
            categories,
            by_lower,
        })
    }

    /// The built-in twelve-category retail taxonomy.
    pub fn standard() -> Self {
        let entries = catalog::STANDARD_CATALOG
            .iter()
            .map(|(name, subs)| (*name, subs.to_vec()));
        match Self::new(entries) {
            Ok(taxonomy) => taxonomy,
            Err(e) => unreachable!("built-in catalog is well formed: {e}"),
        }
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = &CategoryDef> {
        self.categories.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Case-insensitive exact category lookup.
    pub fn category(&self, name: &str) -> Option<&CategoryDef> {
        self.by_lower
            .get(&name.trim().to_lowercase())
            .map(|&idx| &self.categories[idx])
    }

    /// Returns `true` if the pair is a member, spelled canonically.
    pub fn contains(&self, pair: &CategoryPair) -> bool {
        self.category(&pair.category)
            .is_some_and(|c| c.name == pair.category && c.subcategories.contains(&pair.subcategory))
    }

    /// Case-insensitive membership check that returns the canonical spelling.
    pub fn canonical(&self, category: &str, subcategory: &str) -> Option<CategoryPair> {
        let def = self.category(category)?;
        let sub = def.subcategory(subcategory)?;
        Some(CategoryPair::new(def.name(), sub))
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::standard()
    }
}
