use super::similarity::*;
use crate::taxonomy::{CategoryPair, Taxonomy};

fn pair(category: &str, subcategory: &str) -> CategoryPair {
    CategoryPair::new(category, subcategory)
}

#[test]
fn test_cosine_similarity_basics() {
    assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
}

#[test]
fn test_cosine_similarity_degenerate_inputs() {
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
    assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
}

#[test]
fn test_f16_variant_matches_f32() {
    let a = [0.3f32, -0.2, 0.9, 0.1];
    let b = [0.25f32, -0.1, 0.8, 0.3];
    let exact = cosine_similarity(&a, &b);
    let mixed = cosine_similarity_f16_f32(&f32_to_f16_vec(&a), &b);
    assert!((exact - mixed).abs() < 1e-3);
}

#[test]
fn test_best_match_respects_threshold() {
    let index = SimilarityIndex::new(2);
    index.insert("nike running shoes", pair("Footwear", "Athletic Shoes"), &[1.0, 0.0]);

    // cos = 0.8 < 0.85
    assert!(index.best_match(&[0.8, 0.6], 0.85).is_none());

    // cos ≈ 0.894 ≥ 0.85
    let hit = index
        .best_match(&[0.894, 0.447], 0.85)
        .expect("Should match above threshold");
    assert_eq!(hit.title, "nike running shoes");
    assert_eq!(hit.pair, pair("Footwear", "Athletic Shoes"));
}

#[test]
fn test_best_match_threshold_is_inclusive() {
    let index = SimilarityIndex::new(2);
    index.insert("exact", pair("Books & Media", "Books"), &[1.0, 0.0]);
    assert!(index.best_match(&[1.0, 0.0], 1.0 - 1e-3).is_some());
}

#[test]
fn test_best_match_picks_highest_and_first_on_tie() {
    let index = SimilarityIndex::new(2);
    index.insert("first", pair("Electronics", "Computers"), &[1.0, 0.0]);
    index.insert("second", pair("Electronics", "Cameras"), &[1.0, 0.0]);
    index.insert("closer", pair("Electronics", "Wearables"), &[0.6, 0.8]);

    let hit = index.best_match(&[1.0, 0.0], 0.5).expect("Should match");
    assert_eq!(hit.title, "first");

    let hit = index.best_match(&[0.6, 0.8], 0.5).expect("Should match");
    assert_eq!(hit.title, "closer");
}

#[test]
fn test_insert_overwrites_same_title() {
    let index = SimilarityIndex::new(2);
    index.insert("mac lipstick", pair("Beauty", "Skincare"), &[1.0, 0.0]);
    index.insert("mac lipstick", pair("Beauty", "Makeup"), &[0.0, 1.0]);

    assert_eq!(index.len(), 1);
    let hit = index.best_match(&[0.0, 1.0], 0.9).expect("Should match");
    assert_eq!(hit.pair.subcategory, "Makeup");
}

#[test]
fn test_insert_rejects_wrong_dimension() {
    let index = SimilarityIndex::new(3);
    assert!(!index.insert("short", pair("Beauty", "Makeup"), &[1.0, 0.0]));
    assert!(index.is_empty());
    assert!(index.best_match(&[1.0, 0.0], 0.0).is_none());
}

#[test]
fn test_snapshot_round_trip_through_file() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("similarity.rkyv");
    let taxonomy = Taxonomy::standard();

    let index = SimilarityIndex::new(4);
    index.insert("ipad pro", pair("Electronics", "Computers"), &[0.5, 0.5, 0.5, 0.5]);
    index.insert("levi's jeans", pair("Clothing", "Bottoms"), &[0.0, 1.0, 0.0, 0.0]);
    index.save(&path).expect("Failed to save");

    let loaded = SimilarityIndex::load(&path, 4, &taxonomy).expect("Failed to load");
    assert_eq!(loaded.len(), 2);
    let hit = loaded
        .best_match(&[0.0, 1.0, 0.0, 0.0], 0.99)
        .expect("Should match");
    assert_eq!(hit.title, "levi's jeans");
}

#[test]
fn test_load_missing_file_is_empty() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let loaded = SimilarityIndex::load(&dir.path().join("absent.rkyv"), 4, &Taxonomy::standard())
        .expect("Missing snapshot is not an error");
    assert!(loaded.is_empty());
}

#[test]
fn test_from_snapshot_skips_incompatible_rows() {
    let index = SimilarityIndex::new(2);
    index.insert("ok", pair("Electronics", "Computers"), &[1.0, 0.0]);
    index.insert("retired", pair("Retired", "Gone"), &[0.0, 1.0]);
    let snapshot = index.to_snapshot();

    let same_dim = SimilarityIndex::from_snapshot(snapshot.clone(), 2, &Taxonomy::standard());
    assert_eq!(same_dim.len(), 1);

    let other_dim = SimilarityIndex::from_snapshot(snapshot, 3, &Taxonomy::standard());
    assert!(other_dim.is_empty());
}

#[test]
fn test_bytes_to_f16_rejects_odd_length() {
    assert!(bytes_to_f16_vec(&[0u8, 1, 2]).is_empty());
    assert_eq!(bytes_to_f16_vec(&[0u8; 8]).len(), 4);
}

#[test]
fn test_bytes_to_f16_decodes_unaligned_buffers() {
    let values = [half::f16::from_f32(0.5), half::f16::from_f32(-1.25)];
    let mut buf = vec![0xAAu8];
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    let decoded = bytes_to_f16_vec(&buf[1..]);
    assert_eq!(decoded, values.to_vec());
}
