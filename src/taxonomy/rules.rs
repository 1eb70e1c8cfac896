//! Ordered keyword tables over the taxonomy.
//!
//! All tables are substring matches against the normalized (lower-case) text,
//! and the first rule in table order wins.

use super::catalog;
use super::error::{TaxonomyError, TaxonomyResult};
use super::{CategoryPair, Taxonomy};

/// A set of keywords that maps to one taxonomy pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    keywords: Vec<String>,
    target: CategoryPair,
}

impl KeywordRule {
    pub fn new<K: Into<String>>(
        keywords: impl IntoIterator<Item = K>,
        target: CategoryPair,
    ) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| {
                    let k: String = k.into();
                    k.trim().to_lowercase()
                })
                .filter(|k| !k.is_empty())
                .collect(),
            target,
        }
    }

    #[inline]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[inline]
    pub fn target(&self) -> &CategoryPair {
        &self.target
    }

    /// Returns the first keyword contained in `text`.
    pub fn matched_keyword(&self, text: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| text.contains(k.as_str()))
            .map(String::as_str)
    }
}

/// Ordered keyword → pair table, checked against the taxonomy at construction.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<KeywordRule>,
}

impl RuleTable {
    /// Builds a table whose targets are all canonical taxonomy members.
    ///
    /// Targets are matched case-insensitively and stored in canonical spelling.
    pub fn new(rules: Vec<KeywordRule>, taxonomy: &Taxonomy) -> TaxonomyResult<Self> {
        let mut checked = Vec::with_capacity(rules.len());
        for rule in rules {
            let Some(first) = rule.keywords.first() else {
                return Err(TaxonomyError::EmptyRule {
                    category: rule.target.category,
                    subcategory: rule.target.subcategory,
                });
            };
            let Some(target) = taxonomy.canonical(&rule.target.category, &rule.target.subcategory)
            else {
                return Err(TaxonomyError::RuleOutsideTaxonomy {
                    keyword: first.clone(),
                    category: rule.target.category,
                    subcategory: rule.target.subcategory,
                });
            };
            checked.push(KeywordRule {
                keywords: rule.keywords,
                target,
            });
        }
        Ok(Self { rules: checked })
    }

    /// Built-in rule-tier table.
    pub fn standard(taxonomy: &Taxonomy) -> TaxonomyResult<Self> {
        Self::new(table_from(catalog::STANDARD_RULES), taxonomy)
    }

    /// A table that never fires.
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// First rule whose keyword occurs in the normalized title.
    pub fn classify(&self, normalized: &str) -> Option<&CategoryPair> {
        self.rules
            .iter()
            .find(|rule| rule.matched_keyword(normalized).is_some())
            .map(KeywordRule::target)
    }
}

/// Keyword table with a guaranteed answer.
#[derive(Debug, Clone)]
pub struct FallbackTable {
    table: RuleTable,
    default: CategoryPair,
}

impl FallbackTable {
    pub fn new(
        rules: Vec<KeywordRule>,
        default: CategoryPair,
        taxonomy: &Taxonomy,
    ) -> TaxonomyResult<Self> {
        let table = RuleTable::new(rules, taxonomy)?;
        let default = taxonomy
            .canonical(&default.category, &default.subcategory)
            .ok_or_else(|| TaxonomyError::RuleOutsideTaxonomy {
                keyword: "<default>".to_string(),
                category: default.category.clone(),
                subcategory: default.subcategory.clone(),
            })?;
        Ok(Self { table, default })
    }

    /// Built-in fallback table (`Clothing|Accessories` when nothing matches).
    pub fn standard(taxonomy: &Taxonomy) -> TaxonomyResult<Self> {
        let (category, subcategory) = catalog::DEFAULT_FALLBACK;
        Self::new(
            table_from(catalog::FALLBACK_RULES),
            CategoryPair::new(category, subcategory),
            taxonomy,
        )
    }

    pub fn default_pair(&self) -> &CategoryPair {
        &self.default
    }

    /// Always returns a taxonomy member.
    pub fn classify(&self, normalized: &str) -> &CategoryPair {
        self.table.classify(normalized).unwrap_or(&self.default)
    }
}

/// Hints that rescue a category name the service misspelled or paraphrased.
#[derive(Debug, Clone)]
pub struct CategoryKeywords {
    entries: Vec<(Vec<String>, String)>,
}

impl CategoryKeywords {
    /// Builds the table; entries naming unknown categories are dropped.
    pub fn new<K: Into<String>, C: Into<String>>(
        entries: impl IntoIterator<Item = (Vec<K>, C)>,
        taxonomy: &Taxonomy,
    ) -> Self {
        let entries = entries
            .into_iter()
            .filter_map(|(keywords, category)| {
                let category: String = category.into();
                let canonical = taxonomy.category(&category)?.name().to_string();
                let keywords = keywords
                    .into_iter()
                    .map(|k| {
                        let k: String = k.into();
                        k.to_lowercase()
                    })
                    .collect();
                Some((keywords, canonical))
            })
            .collect();
        Self { entries }
    }

    pub fn standard(taxonomy: &Taxonomy) -> Self {
        Self::new(
            catalog::CATEGORY_KEYWORDS
                .iter()
                .map(|(keywords, category)| (keywords.to_vec(), *category)),
            taxonomy,
        )
    }

    /// Category whose keyword occurs in `lowered` (first entry wins).
    pub fn category_for(&self, lowered: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map(|(_, category)| category.as_str())
    }
}

fn table_from(raw: &[(&[&str], (&str, &str))]) -> Vec<KeywordRule> {
    raw.iter()
        .map(|(keywords, (category, subcategory))| {
            KeywordRule::new(keywords.iter().copied(), CategoryPair::new(*category, *subcategory))
        })
        .collect()
}
