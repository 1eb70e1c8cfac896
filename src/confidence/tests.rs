use std::sync::Arc;

use super::scoring::{blend, cluster_scores, round3, size_multiplier};
use super::*;
use crate::embedding::{MockEmbedder, TitleEmbedder};

fn pair(category: &str, subcategory: &str) -> CategoryPair {
    CategoryPair::new(category, subcategory)
}

/// Two tight groups of five plus one far outlier, in 4 dimensions.
fn grouped_points(with_outlier: bool) -> Vec<Vec<f32>> {
    let mut points = Vec::new();
    for i in 0..5 {
        points.push(vec![1.0, 0.0, 0.0, 0.02 * i as f32]);
    }
    for i in 0..5 {
        points.push(vec![0.0, 1.0, 0.0, 0.02 * i as f32]);
    }
    if with_outlier {
        points.push(vec![0.0, 0.0, 3.0, 0.0]);
    }
    points
}

#[test]
fn test_size_multiplier_thresholds() {
    assert_eq!(size_multiplier(1), 0.8);
    assert_eq!(size_multiplier(2), 0.8);
    assert_eq!(size_multiplier(3), 0.9);
    assert_eq!(size_multiplier(4), 0.9);
    assert_eq!(size_multiplier(5), 1.0);
    assert_eq!(size_multiplier(9), 1.0);
    assert_eq!(size_multiplier(10), 1.1);
}

#[test]
fn test_cluster_scores_blend_category_and_subcategory_share() {
    let labels = [0, 0, 0, 0, 0, NOISE];
    let pairs = [
        pair("Footwear", "Athletic Shoes"),
        pair("Footwear", "Athletic Shoes"),
        pair("Footwear", "Athletic Shoes"),
        pair("Footwear", "Boots"),
        pair("Clothing", "Boots"),
        pair("Beauty", "Makeup"),
    ];
    let scores = cluster_scores(&labels, &pairs, &ScoringWeights::default());

    // 4/5 share the category, 3/5 the subcategory, size 5 → ×1.0.
    assert_eq!(scores[0], 0.72);
    assert_eq!(scores[5], 0.3);
}

#[test]
fn test_cluster_scores_capped_at_one() {
    let labels = vec![3; 12];
    let pairs = vec![pair("Beauty", "Makeup"); 12];
    let scores = cluster_scores(&labels, &pairs, &ScoringWeights::default());
    assert!(scores.iter().all(|&s| s == 1.0));
}

#[test]
fn test_blend_weights() {
    let w = ScoringWeights::default();
    assert_eq!(blend(0.9, 0.3, &w), 0.72);
    assert_eq!(blend(0.6, 1.0, &w), 0.72);
    assert_eq!(round3(0.12345), 0.123);
}

#[test]
fn test_hdbscan_finds_groups_and_noise() {
    let labels = hdbscan::cluster(&grouped_points(true), &HdbscanConfig::default());

    let a = labels[0];
    let b = labels[5];
    assert_ne!(a, NOISE);
    assert_ne!(b, NOISE);
    assert_ne!(a, b);
    assert!(labels[..5].iter().all(|&l| l == a));
    assert!(labels[5..10].iter().all(|&l| l == b));
    assert_eq!(labels[10], NOISE);
}

#[test]
fn test_hdbscan_too_few_points_is_all_noise() {
    let points = vec![vec![0.0, 0.0], vec![0.1, 0.0], vec![0.0, 0.1]];
    assert_eq!(
        hdbscan::cluster(&points, &HdbscanConfig::default()),
        vec![NOISE; 3]
    );
    assert!(hdbscan::cluster(&[], &HdbscanConfig::default()).is_empty());
}

#[test]
fn test_hdbscan_single_blob_needs_allow_single_cluster() {
    let points: Vec<Vec<f32>> = (0..8).map(|i| vec![0.01 * i as f32, 0.0]).collect();

    let labels = hdbscan::cluster(&points, &HdbscanConfig::default());
    assert!(labels.iter().all(|&l| l == NOISE));

    let config = HdbscanConfig {
        allow_single_cluster: true,
        ..HdbscanConfig::default()
    };
    let labels = hdbscan::cluster(&points, &config);
    assert!(labels.iter().all(|&l| l == 0));
}

#[test]
fn test_manifold_skips_small_inputs() {
    let reducer = ManifoldReducer::default();
    let points = grouped_points(true);
    assert!(reducer.skips(points.len()));
    assert_eq!(reducer.fit_transform(&points), points);
}

#[test]
fn test_manifold_is_deterministic_and_separates_groups() {
    let mut points = Vec::new();
    for i in 0..20 {
        let mut v = vec![0.0f32; 16];
        v[0] = 1.0;
        v[1 + i % 5] = 0.05 * (i / 5) as f32;
        points.push(v);
    }
    for i in 0..20 {
        let mut v = vec![0.0f32; 16];
        v[8] = 1.0;
        v[9 + i % 5] = 0.05 * (i / 5) as f32;
        points.push(v);
    }

    let reducer = ManifoldReducer::default();
    let first = reducer.fit_transform(&points);
    let second = reducer.fit_transform(&points);
    assert_eq!(first, second);
    assert_eq!(first.len(), 40);
    assert!(first.iter().all(|v| v.len() == 10));
    assert!(first.iter().flatten().all(|x| x.is_finite()));

    let dist = |a: &[f32], b: &[f32]| -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
    };
    let mean = |pairs: &[(usize, usize)]| -> f32 {
        pairs.iter().map(|&(i, j)| dist(&first[i], &first[j])).sum::<f32>() / pairs.len() as f32
    };
    let intra: Vec<(usize, usize)> = (0..20)
        .flat_map(|i| (i + 1..20).map(move |j| (i, j)))
        .chain((20..40).flat_map(|i| (i + 1..40).map(move |j| (i, j))))
        .collect();
    let inter: Vec<(usize, usize)> = (0..20).flat_map(|i| (20..40).map(move |j| (i, j))).collect();
    assert!(mean(&inter) > mean(&intra));
}

fn estimator(embedder: Arc<MockEmbedder>, blend_with_base: bool) -> ClusterConfidenceEstimator {
    let config = ConfidenceConfig {
        blend_with_base,
        ..ConfidenceConfig::default()
    };
    ClusterConfidenceEstimator::new(embedder as Arc<dyn TitleEmbedder>, config)
}

fn grouped_batch(embedder: &MockEmbedder) -> (Vec<String>, Vec<CategoryPair>) {
    let mut titles = Vec::new();
    let mut pairs = Vec::new();
    for (i, v) in grouped_points(true).into_iter().enumerate() {
        let title = format!("title {i}");
        embedder.pin(&title, &v);
        titles.push(title);
        pairs.push(match i {
            0..5 => pair("Footwear", "Athletic Shoes"),
            5..10 => pair("Beauty", "Makeup"),
            _ => pair("Books & Media", "Books"),
        });
    }
    (titles, pairs)
}

#[test]
fn test_estimate_blends_cluster_and_base() {
    let embedder = Arc::new(MockEmbedder::new(4));
    let (titles, pairs) = grouped_batch(&embedder);
    let base = vec![0.9; titles.len()];

    let report = estimator(embedder, true)
        .estimate(&titles, &pairs, &base)
        .expect("estimate");

    assert_eq!(report.labels.len(), 11);
    assert_eq!(report.cluster_scores[0], 1.0);
    assert_eq!(report.confidences[0], 0.93);
    assert_eq!(report.labels[10], NOISE);
    assert_eq!(report.cluster_scores[10], 0.3);
    assert_eq!(report.confidences[10], 0.72);

    assert_eq!(report.analysis.cluster_count(), 2);
    assert_eq!(report.analysis.noise, 1);
    let footwear = report
        .analysis
        .clusters
        .iter()
        .find(|c| c.dominant_category == "Footwear")
        .expect("footwear cluster");
    assert_eq!(footwear.size, 5);
    assert_eq!(footwear.consistency_ratio, 1.0);
    assert_eq!(footwear.examples.len(), 5);
}

#[test]
fn test_estimate_without_blend_uses_cluster_scores() {
    let embedder = Arc::new(MockEmbedder::new(4));
    let (titles, pairs) = grouped_batch(&embedder);
    let base = vec![0.6; titles.len()];

    let report = estimator(embedder, false)
        .estimate(&titles, &pairs, &base)
        .expect("estimate");
    assert_eq!(report.confidences, report.cluster_scores);
}

#[test]
fn test_estimate_is_idempotent() {
    let embedder = Arc::new(MockEmbedder::new(4));
    let (titles, pairs) = grouped_batch(&embedder);
    let base = vec![0.9; titles.len()];
    let estimator = estimator(embedder, true);

    let first = estimator.estimate(&titles, &pairs, &base).expect("estimate");
    let second = estimator.estimate(&titles, &pairs, &base).expect("estimate");
    assert_eq!(first, second);
}

#[test]
fn test_estimate_propagates_embedding_failure() {
    let embedder = Arc::new(MockEmbedder::new(4));
    let (titles, pairs) = grouped_batch(&embedder);
    embedder.set_failing(true);

    let err = estimator(embedder, true)
        .estimate(&titles, &pairs, &vec![0.9; titles.len()])
        .unwrap_err();
    assert!(matches!(err, ConfidenceError::Embedding(_)));
}

#[test]
fn test_estimate_rejects_mismatched_inputs() {
    let embedder = Arc::new(MockEmbedder::new(4));
    let err = estimator(embedder, true)
        .estimate(&["a".to_string()], &[], &[0.9])
        .unwrap_err();
    assert!(matches!(err, ConfidenceError::LengthMismatch { .. }));
}

#[test]
fn test_estimate_empty_batch() {
    let embedder = Arc::new(MockEmbedder::new(4));
    let report = estimator(embedder.clone(), true)
        .estimate(&[], &[], &[])
        .expect("estimate");
    assert_eq!(report, ConfidenceReport::default());
    assert_eq!(embedder.call_count(), 0);
}

/// A consistent group of ten, a group of five and one far outlier, all
/// labelled alike so only cluster membership separates their scores.
fn large_group_batch() -> (Vec<Vec<f32>>, Vec<String>, Vec<CategoryPair>) {
    let mut points: Vec<Vec<f32>> = (0..10).map(|i| vec![1.0, 0.0, 0.0, 0.02 * i as f32]).collect();
    points.extend((0..5).map(|i| vec![0.0, 1.0, 0.0, 0.02 * i as f32]));
    points.push(vec![0.0, 0.0, 3.0, 0.0]);
    let titles = (0..points.len()).map(|i| format!("title {i}")).collect();
    let pairs = vec![pair("Beauty", "Makeup"); points.len()];
    (points, titles, pairs)
}

#[test]
fn test_noise_never_outscores_cluster_members_at_equal_base() {
    let (points, titles, pairs) = large_group_batch();
    let base = vec![0.9; points.len()];

    for blend_with_base in [true, false] {
        let config = ConfidenceConfig {
            // Keep raw vectors so the layout is exact.
            manifold: ManifoldConfig {
                n_components: 16,
                ..ManifoldConfig::default()
            },
            blend_with_base,
            ..ConfidenceConfig::default()
        };
        let estimator = ClusterConfidenceEstimator::new(
            Arc::new(MockEmbedder::new(4)) as Arc<dyn TitleEmbedder>,
            config,
        );
        let report = estimator.score_embeddings(&points, &titles, &pairs, &base);

        assert_eq!(report.labels[15], NOISE);
        assert_eq!(report.cluster_scores[15], 0.3);
        assert!(report.labels[..10].iter().all(|&l| l != NOISE));
        assert!(report.cluster_scores[..10].iter().all(|&s| s == 1.0));

        let noise = report.confidences[15];
        for &member in &report.confidences[..10] {
            assert!(noise <= member, "noise {noise} above member {member}");
        }
        if blend_with_base {
            assert_eq!(report.confidences[0], 0.93);
            assert_eq!(noise, 0.72);
        } else {
            assert_eq!(report.confidences[0], 1.0);
            assert_eq!(noise, 0.3);
        }
    }

    // The ordering needs equal base confidence: a confident noise point
    // still beats a weak title inside a tight cluster once blended.
    let w = ScoringWeights::default();
    assert_eq!(blend(0.3, 1.0, &w), 0.51);
    assert!(blend(0.9, 0.3, &w) > blend(0.3, 1.0, &w));
}
