//! Constrained prompt for single-title categorization.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::taxonomy::Taxonomy;

/// Subcategories listed per category in the system prompt.
const SUBCATEGORIES_SHOWN: usize = 5;

const FEW_SHOT: &[(&str, &str)] = &[
    ("Nike Air Max Running Shoes", "Footwear|Athletic Shoes"),
    ("Samsung Galaxy Phone", "Electronics|Mobile Phones"),
    ("Levi's Jeans", "Clothing|Bottoms"),
    ("MAC Lipstick", "Beauty|Makeup"),
];

/// System prompt built once per taxonomy; user turns are built per title.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: Arc<str>,
}

impl PromptTemplate {
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let mut options = String::new();
        for def in taxonomy.categories() {
            let shown: Vec<&str> = def
                .subcategories()
                .iter()
                .take(SUBCATEGORIES_SHOWN)
                .map(String::as_str)
                .collect();
            let _ = writeln!(options, "- {}: {}...", def.name(), shown.join(", "));
        }

        let mut examples = String::new();
        for (title, answer) in FEW_SHOT {
            let _ = writeln!(examples, "- {title} → {answer}");
        }

        let system = format!(
            "You are a product categorization expert. You MUST categorize products using ONLY \
the predefined categories and subcategories provided.

STRICT FORMAT REQUIREMENT:
- Output format: Category|Subcategory
- Use ONLY categories and subcategories from the provided list
- If uncertain, choose the closest match
- NEVER create new categories or subcategories
- NEVER include explanations, just the category pair

VALID CATEGORIES:
{}
Examples:
{}",
            options,
            examples.trim_end()
        );

        Self {
            system: Arc::from(system),
        }
    }

    #[inline]
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Prompt for one normalized title.
    pub fn for_title(&self, title: &str) -> Prompt {
        Prompt {
            system: self.system.clone(),
            user: format!("Categorize this product (format: Category|Subcategory): {title}"),
            title: title.to_string(),
        }
    }
}

/// One request to the categorization service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    system: Arc<str>,
    user: String,
    title: String,
}

impl Prompt {
    #[inline]
    pub fn system(&self) -> &str {
        &self.system
    }

    #[inline]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The normalized title this prompt asks about.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }
}
