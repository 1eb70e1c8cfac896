use std::sync::Arc;

use super::parse::{parse_structured, separator_candidates, strip_prefixes};
use super::validator::closest_subcategory;
use super::*;

fn validator() -> TaxonomyValidator {
    TaxonomyValidator::standard(Arc::new(Taxonomy::standard())).expect("standard tables are valid")
}

#[test]
fn test_standard_taxonomy_shape() {
    let taxonomy = Taxonomy::standard();
    assert_eq!(taxonomy.len(), 12);

    let footwear = taxonomy.category("footwear").expect("footwear exists");
    assert_eq!(footwear.name(), "Footwear");
    assert_eq!(footwear.default_subcategory(), "Athletic Shoes");
    assert!(taxonomy.contains(&CategoryPair::new("Beauty", "Men's Grooming")));
    assert!(!taxonomy.contains(&CategoryPair::new("beauty", "makeup")));
    assert_eq!(
        taxonomy.canonical("beauty", "makeup"),
        Some(CategoryPair::new("Beauty", "Makeup"))
    );
}

#[test]
fn test_taxonomy_rejects_bad_input() {
    let empty: Vec<(&str, Vec<&str>)> = vec![];
    assert_eq!(Taxonomy::new(empty).unwrap_err(), TaxonomyError::Empty);

    let no_subs = vec![("Garden", Vec::<&str>::new())];
    assert!(matches!(
        Taxonomy::new(no_subs),
        Err(TaxonomyError::NoSubcategories { .. })
    ));

    let dup = vec![("Garden", vec!["Tools"]), ("garden", vec!["Seeds"])];
    assert!(matches!(
        Taxonomy::new(dup),
        Err(TaxonomyError::DuplicateCategory { .. })
    ));
}

#[test]
fn test_strip_prefixes() {
    assert_eq!(strip_prefixes("  Category: Footwear|Boots "), "Footwear|Boots");
    assert_eq!(strip_prefixes("ANSWER: Beauty|Makeup"), "Beauty|Makeup");
    assert_eq!(
        strip_prefixes("The category is Electronics|Gaming"),
        "Electronics|Gaming"
    );
    assert_eq!(strip_prefixes("Clothing|Tops"), "Clothing|Tops");
}

#[test]
fn test_separator_candidates_order() {
    let candidates = separator_candidates("Footwear - Running Shoes");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].category, "Footwear");
    assert_eq!(candidates[0].subcategory, "Running Shoes");

    let candidates = separator_candidates("Electronics > Gaming");
    assert_eq!(candidates[0].category, "Electronics");
    assert_eq!(candidates[0].subcategory, "Gaming");

    let candidates = separator_candidates("Home & Garden|Kitchen & Dining");
    assert_eq!(candidates[0].category, "Home & Garden");
    assert_eq!(candidates[0].subcategory, "Kitchen & Dining");

    assert!(separator_candidates("no separators here").is_empty());
}

#[test]
fn test_parse_structured() {
    let raw = parse_structured(r#"{"category": "Beauty", "subcategory": "Makeup"}"#)
        .expect("should parse json");
    assert_eq!(raw.category, "Beauty");
    assert_eq!(raw.subcategory, "Makeup");

    assert!(parse_structured("Beauty|Makeup").is_none());
    assert!(parse_structured(r#"{"label": "Beauty"}"#).is_none());
}

#[test]
fn test_exact_pipe_response_is_valid() {
    let v = validator();
    let outcome = v.validate("Footwear|Athletic Shoes", "nike air max");
    assert_eq!(
        outcome,
        Outcome::Valid(CategoryPair::new("Footwear", "Athletic Shoes"))
    );
}

#[test]
fn test_apostrophe_subcategories_are_valid() {
    let v = validator();

    let jewelry = v.validate("Jewelry & Watches|Men's Jewelry", "steel cuff for men");
    assert_eq!(
        jewelry,
        Outcome::Valid(CategoryPair::new("Jewelry & Watches", "Men's Jewelry"))
    );

    let grooming = v.validate("Beauty - Men's Grooming", "beard trimmer kit");
    assert_eq!(
        grooming,
        Outcome::Valid(CategoryPair::new("Beauty", "Men's Grooming"))
    );

    let candidates = separator_candidates("Jewelry & Watches|Men's Jewelry");
    assert_eq!(candidates[0].subcategory, "Men's Jewelry");
}

#[test]
fn test_case_insensitive_match_is_valid_and_canonical() {
    let v = validator();
    let outcome = v.validate("electronics|mobile phones", "samsung galaxy phone");
    assert_eq!(
        outcome,
        Outcome::Valid(CategoryPair::new("Electronics", "Mobile Phones"))
    );
}

#[test]
fn test_dash_response_with_unknown_subcategory_is_corrected() {
    let v = validator();
    let outcome = v.validate("Footwear - Running Shoes", "nike air max running shoes");

    assert!(!outcome.is_valid());
    assert_eq!(outcome.pair().category, "Footwear");
    assert!(v.taxonomy().contains(outcome.pair()));
    assert!(matches!(outcome, Outcome::Corrected(_)));
}

#[test]
fn test_dash_response_with_registered_subcategory_is_valid() {
    let taxonomy = Taxonomy::new(vec![
        ("Footwear", vec!["Running Shoes", "Boots"]),
        ("Clothing", vec!["Accessories"]),
    ])
    .expect("valid taxonomy");
    let taxonomy = Arc::new(taxonomy);
    let keywords = CategoryKeywords::standard(&taxonomy);
    let fallback = FallbackTable::new(
        vec![],
        CategoryPair::new("Clothing", "Accessories"),
        &taxonomy,
    )
    .expect("valid fallback");
    let v = TaxonomyValidator::new(taxonomy, keywords, fallback);

    let outcome = v.validate("Footwear - Running Shoes", "nike air max running shoes");
    assert_eq!(
        outcome,
        Outcome::Valid(CategoryPair::new("Footwear", "Running Shoes"))
    );
}

#[test]
fn test_colon_and_arrow_separators() {
    let v = validator();
    assert_eq!(
        v.validate("Beauty: Fragrances", "chanel no 5"),
        Outcome::Valid(CategoryPair::new("Beauty", "Fragrances"))
    );
    assert_eq!(
        v.validate("Toys & Games > Board Games", "catan"),
        Outcome::Valid(CategoryPair::new("Toys & Games", "Board Games"))
    );
}

#[test]
fn test_category_containment_correction() {
    let v = validator();
    let (def, exact) = v.closest_category("Sports").expect("should match by containment");
    assert_eq!(def.name(), "Sports & Outdoors");
    assert!(!exact);
}

#[test]
fn test_category_keyword_correction() {
    let v = validator();
    let (def, exact) = v.closest_category("Sneakers").expect("should match by keyword");
    assert_eq!(def.name(), "Footwear");
    assert!(!exact);

    let (def, _) = v.closest_category("Apparel").expect("should match by keyword");
    assert_eq!(def.name(), "Clothing");

    assert!(v.closest_category("Groceries").is_none());
    assert!(v.closest_category("   ").is_none());
}

#[test]
fn test_subcategory_cascade() {
    let taxonomy = Taxonomy::standard();
    let beauty = taxonomy.category("Beauty").expect("beauty exists");

    assert_eq!(closest_subcategory(beauty, "makeup"), ("Makeup", true));
    assert_eq!(closest_subcategory(beauty, "Men"), ("Men's Grooming", false));
    assert_eq!(closest_subcategory(beauty, "Perfume"), ("Makeup", false));
}

#[test]
fn test_hallucinated_category_in_json_is_corrected() {
    let v = validator();
    let outcome = v.validate(
        r#"{"category": "Fashion Apparel", "subcategory": "Tops"}"#,
        "linen blouse",
    );
    assert_eq!(
        outcome,
        Outcome::Corrected(CategoryPair::new("Clothing", "Tops"))
    );
}

#[test]
fn test_bare_category_mention_uses_default_subcategory() {
    let v = validator();
    let outcome = v.validate("I think this is Electronics", "usb hub");
    assert_eq!(
        outcome,
        Outcome::Corrected(CategoryPair::new("Electronics", "Mobile Phones"))
    );
}

#[test]
fn test_unusable_response_falls_back_on_title_keywords() {
    let v = validator();
    let outcome = v.validate("???", "red leather handbag");
    assert_eq!(
        outcome,
        Outcome::Fallback(CategoryPair::new("Clothing", "Accessories"))
    );

    let outcome = v.validate("", "apple iphone 15");
    assert_eq!(
        outcome,
        Outcome::Fallback(CategoryPair::new("Electronics", "Mobile Phones"))
    );
}

#[test]
fn test_fallback_table_order_and_default() {
    let taxonomy = Taxonomy::standard();
    let fallback = FallbackTable::standard(&taxonomy).expect("valid fallback");

    // "dress" precedes "shoe" in table order.
    assert_eq!(
        fallback.classify("dress shoes"),
        &CategoryPair::new("Clothing", "Tops")
    );
    assert_eq!(
        fallback.classify("garden hose"),
        &CategoryPair::new("Clothing", "Accessories")
    );
}

#[test]
fn test_rule_table_first_match_wins() {
    let taxonomy = Taxonomy::standard();
    let rules = RuleTable::standard(&taxonomy).expect("standard rules are valid");

    assert_eq!(
        rules.classify("nike air max running shoes"),
        Some(&CategoryPair::new("Footwear", "Casual Shoes"))
    );
    assert_eq!(
        rules.classify("sony wireless headphones"),
        Some(&CategoryPair::new("Electronics", "Audio & Video"))
    );
    assert_eq!(
        rules.classify("garmin smartwatch"),
        Some(&CategoryPair::new("Electronics", "Wearables"))
    );
    assert_eq!(rules.classify("cast iron skillet"), None);
}

#[test]
fn test_rule_table_rejects_targets_outside_taxonomy() {
    let taxonomy = Taxonomy::standard();
    let rules = vec![KeywordRule::new(
        ["tv"],
        CategoryPair::new("Electronics", "Televisions"),
    )];
    assert!(matches!(
        RuleTable::new(rules, &taxonomy),
        Err(TaxonomyError::RuleOutsideTaxonomy { .. })
    ));

    let empty_keywords = vec![KeywordRule::new(
        Vec::<String>::new(),
        CategoryPair::new("Beauty", "Makeup"),
    )];
    assert!(matches!(
        RuleTable::new(empty_keywords, &taxonomy),
        Err(TaxonomyError::EmptyRule { .. })
    ));
}

#[test]
fn test_every_outcome_is_a_taxonomy_member() {
    let v = validator();
    let responses = [
        "Footwear|Athletic Shoes",
        "Footwear - Running Shoes",
        "Gadgets|Phones",
        "Answer: Home & Garden > Decor",
        "Category: Vehicles: Tires",
        "Beauty|Men's Grooming",
        r#"{"category": "beauty", "subcategory": "lip stuff"}"#,
        "no idea",
        "",
    ];
    for response in responses {
        let outcome = v.validate(response, "some product");
        assert!(
            v.taxonomy().contains(outcome.pair()),
            "{response:?} produced {}",
            outcome.pair()
        );
    }
}
