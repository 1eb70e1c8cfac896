use thiserror::Error;

/// Errors raised while building a taxonomy or a keyword table over it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
    /// The taxonomy has no categories.
    #[error("taxonomy has no categories")]
    Empty,

    /// A category or subcategory name was blank.
    #[error("taxonomy names must not be blank")]
    EmptyName,

    /// A category was declared without subcategories.
    #[error("category '{category}' has no subcategories")]
    NoSubcategories { category: String },

    /// The same category (case-insensitively) was declared twice.
    #[error("category '{category}' declared more than once")]
    DuplicateCategory { category: String },

    /// A keyword rule points outside the taxonomy.
    #[error("rule for '{keyword}' targets {category}|{subcategory}, which is not in the taxonomy")]
    RuleOutsideTaxonomy {
        keyword: String,
        category: String,
        subcategory: String,
    },

    /// A keyword rule has no keywords.
    #[error("rule targeting {category}|{subcategory} has no keywords")]
    EmptyRule {
        category: String,
        subcategory: String,
    },
}

/// Convenience result type for taxonomy construction.
pub type TaxonomyResult<T> = Result<T, TaxonomyError>;
