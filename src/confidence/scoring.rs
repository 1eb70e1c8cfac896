//! Label-consistency scores per cluster.

use std::collections::HashMap;

use serde::Serialize;

use super::hdbscan::NOISE;
use crate::taxonomy::CategoryPair;

/// Blend weights and the flat noise score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub category: f32,
    pub subcategory: f32,
    /// Weight of the per-title base signal when blending.
    pub base: f32,
    /// Weight of the cluster signal when blending.
    pub cluster: f32,
    /// Cluster score for noise points.
    pub noise: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category: 0.6,
            subcategory: 0.4,
            base: 0.7,
            cluster: 0.3,
            noise: 0.3,
        }
    }
}

/// Reward large clusters, discount small ones.
#[inline]
pub fn size_multiplier(size: usize) -> f32 {
    match size {
        s if s >= 10 => 1.1,
        s if s >= 5 => 1.0,
        s if s >= 3 => 0.9,
        _ => 0.8,
    }
}

#[inline]
pub fn round3(v: f32) -> f32 {
    (v * 1000.0).round() / 1000.0
}

/// Per-title cluster score: share of the cluster agreeing on category and
/// subcategory, scaled by cluster size and capped at 1.
pub fn cluster_scores(labels: &[i32], pairs: &[CategoryPair], weights: &ScoringWeights) -> Vec<f32> {
    let mut members: HashMap<i32, Vec<usize>> = HashMap::new();
    for (i, &label) in labels.iter().enumerate() {
        if label != NOISE {
            members.entry(label).or_default().push(i);
        }
    }

    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| {
            let Some(group) = members.get(&label) else {
                return weights.noise;
            };
            let size = group.len();
            let same_category = group
                .iter()
                .filter(|&&j| pairs[j].category == pairs[i].category)
                .count();
            let same_subcategory = group
                .iter()
                .filter(|&&j| pairs[j].subcategory == pairs[i].subcategory)
                .count();

            let raw = weights.category * (same_category as f32 / size as f32)
                + weights.subcategory * (same_subcategory as f32 / size as f32);
            round3((raw * size_multiplier(size)).min(1.0))
        })
        .collect()
}

/// `base·w_base + cluster·w_cluster`, rounded.
#[inline]
pub fn blend(base: f32, cluster: f32, weights: &ScoringWeights) -> f32 {
    round3((weights.base * base + weights.cluster * cluster).clamp(0.0, 1.0))
}

/// One cluster in the analysis report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub label: i32,
    pub size: usize,
    pub dominant_category: String,
    /// Share of members in the dominant category.
    pub consistency_ratio: f32,
    /// Up to five member titles, in input order.
    pub examples: Vec<String>,
}

/// Composition of every cluster found in a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterAnalysis {
    pub clusters: Vec<ClusterSummary>,
    pub noise: usize,
}

const EXAMPLES_PER_CLUSTER: usize = 5;

impl ClusterAnalysis {
    pub fn from_labels(labels: &[i32], titles: &[String], pairs: &[CategoryPair]) -> Self {
        let mut groups: Vec<(i32, Vec<usize>)> = Vec::new();
        let mut noise = 0;
        for (i, &label) in labels.iter().enumerate() {
            if label == NOISE {
                noise += 1;
                continue;
            }
            match groups.iter_mut().find(|(l, _)| *l == label) {
                Some((_, members)) => members.push(i),
                None => groups.push((label, vec![i])),
            }
        }
        groups.sort_by_key(|(label, _)| *label);

        let clusters = groups
            .into_iter()
            .map(|(label, members)| {
                let mut counts: Vec<(&str, usize)> = Vec::new();
                for &i in &members {
                    let category = pairs[i].category.as_str();
                    match counts.iter_mut().find(|(c, _)| *c == category) {
                        Some((_, n)) => *n += 1,
                        None => counts.push((category, 1)),
                    }
                }
                // First-seen category wins ties.
                let (dominant, top) = counts
                    .iter()
                    .fold(("", 0usize), |best, &(c, n)| if n > best.1 { (c, n) } else { best });

                ClusterSummary {
                    label,
                    size: members.len(),
                    dominant_category: dominant.to_string(),
                    consistency_ratio: round3(top as f32 / members.len() as f32),
                    examples: members
                        .iter()
                        .take(EXAMPLES_PER_CLUSTER)
                        .map(|&i| titles[i].clone())
                        .collect(),
                }
            })
            .collect();

        Self { clusters, noise }
    }

    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}
