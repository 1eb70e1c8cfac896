//! Nonlinear manifold reduction.
//!
//! A fuzzy simplicial-set embedding in the UMAP family:
//!
//! 1. k-nearest neighbours per point on cosine distance.
//! 2. Per-point bandwidth (`rho`, `sigma`) so each neighbourhood sums to `log2(k)`.
//! 3. Symmetrize with the fuzzy union `a + b - ab`.
//! 4. Lay the graph out in `n_components` dimensions by stochastic gradient
//!    descent with negative sampling, from a seeded random start.
//!
//! Output is deterministic for a given input order and seed.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::cache::cosine_similarity;

/// Curve parameters fitted for `min_dist = 0.1`, `spread = 1.0`.
const CURVE_A: f32 = 1.577;
const CURVE_B: f32 = 0.895;
const GRADIENT_CLIP: f32 = 4.0;
const SIGMA_SEARCH_STEPS: usize = 64;
const SIGMA_TOLERANCE: f32 = 1e-5;
const MIN_SIGMA_SCALE: f32 = 1e-3;
const INIT_RANGE: f32 = 10.0;

/// Reducer parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifoldConfig {
    pub n_components: usize,
    pub n_neighbors: usize,
    pub n_epochs: usize,
    pub negative_sample_rate: usize,
    pub learning_rate: f32,
    pub seed: u64,
}

impl Default for ManifoldConfig {
    fn default() -> Self {
        Self {
            n_components: 10,
            n_neighbors: 15,
            n_epochs: 200,
            negative_sample_rate: 5,
            learning_rate: 1.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    head: usize,
    tail: usize,
    weight: f32,
}

#[derive(Debug, Clone, Default)]
pub struct ManifoldReducer {
    config: ManifoldConfig,
}

impl ManifoldReducer {
    pub fn new(config: ManifoldConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &ManifoldConfig {
        &self.config
    }

    /// Returns `true` if `n` points are too few for a meaningful layout.
    #[inline]
    pub fn skips(&self, n: usize) -> bool {
        n <= self.config.n_components + 1 || n < 3
    }

    /// Embeds `data` into `n_components` dimensions.
    ///
    /// With too few points the input is returned unchanged.
    pub fn fit_transform(&self, data: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let n = data.len();
        if self.skips(n) {
            debug!(points = n, "Too few points for manifold reduction; using raw vectors");
            return data.to_vec();
        }

        let k = self.config.n_neighbors.min(n - 1).max(1);
        let knn = nearest_neighbours(data, k);
        let edges = fuzzy_graph(&knn, k);
        let layout = self.optimize(n, &edges);
        debug!(points = n, edges = edges.len(), "Manifold reduction complete");

        layout
            .chunks(self.config.n_components)
            .map(<[f32]>::to_vec)
            .collect()
    }

    fn optimize(&self, n: usize, edges: &[Edge]) -> Vec<f32> {
        let dim = self.config.n_components;
        let n_epochs = self.config.n_epochs.max(1);
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut y: Vec<f32> = (0..n * dim)
            .map(|_| rng.random::<f32>() * 2.0 * INIT_RANGE - INIT_RANGE)
            .collect();

        let max_weight = edges.iter().map(|e| e.weight).fold(0.0f32, f32::max);
        if max_weight <= 0.0 {
            return y;
        }

        // Edges too weak to be sampled even once are dropped.
        let edges: Vec<Edge> = edges
            .iter()
            .copied()
            .filter(|e| e.weight * n_epochs as f32 >= max_weight)
            .collect();
        let epochs_per_sample: Vec<f32> = edges.iter().map(|e| max_weight / e.weight).collect();
        let neg_rate = self.config.negative_sample_rate as f32;
        let epochs_per_negative: Vec<f32> =
            epochs_per_sample.iter().map(|&eps| eps / neg_rate.max(1.0)).collect();
        let mut next_sample = epochs_per_sample.clone();
        let mut next_negative = epochs_per_negative.clone();

        let mut current = vec![0.0f32; dim];
        for epoch in 0..n_epochs {
            let alpha = self.config.learning_rate * (1.0 - epoch as f32 / n_epochs as f32);
            let epoch_f = epoch as f32;

            for (idx, edge) in edges.iter().enumerate() {
                if next_sample[idx] > epoch_f {
                    continue;
                }

                let (h, t) = (edge.head * dim, edge.tail * dim);
                let dist_sq = squared_distance(&y[h..h + dim], &y[t..t + dim]);
                let coeff = if dist_sq > 0.0 {
                    -2.0 * CURVE_A * CURVE_B * dist_sq.powf(CURVE_B - 1.0)
                        / (CURVE_A * dist_sq.powf(CURVE_B) + 1.0)
                } else {
                    0.0
                };
                for d in 0..dim {
                    let grad = clip(coeff * (y[h + d] - y[t + d]));
                    y[h + d] += grad * alpha;
                    y[t + d] -= grad * alpha;
                }
                next_sample[idx] += epochs_per_sample[idx];

                let n_neg = ((epoch_f - next_negative[idx]) / epochs_per_negative[idx])
                    .max(0.0)
                    .floor() as usize;
                current.copy_from_slice(&y[h..h + dim]);
                for _ in 0..n_neg {
                    let other = rng.random_range(0..n);
                    if other == edge.head {
                        continue;
                    }
                    let o = other * dim;
                    let dist_sq = squared_distance(&current, &y[o..o + dim]);
                    let coeff = if dist_sq > 0.0 {
                        2.0 * CURVE_B
                            / ((0.001 + dist_sq) * (CURVE_A * dist_sq.powf(CURVE_B) + 1.0))
                    } else {
                        0.0
                    };
                    for d in 0..dim {
                        let grad = if coeff > 0.0 {
                            clip(coeff * (current[d] - y[o + d]))
                        } else {
                            GRADIENT_CLIP
                        };
                        current[d] += grad * alpha;
                    }
                }
                y[h..h + dim].copy_from_slice(&current);
                next_negative[idx] += n_neg as f32 * epochs_per_negative[idx];
            }
        }
        y
    }
}

#[inline]
fn clip(v: f32) -> f32 {
    v.clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
}

#[inline]
fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// `k` nearest neighbours per point (self excluded), closest first.
fn nearest_neighbours(data: &[Vec<f32>], k: usize) -> Vec<Vec<(usize, f32)>> {
    data.iter()
        .enumerate()
        .map(|(i, a)| {
            let mut row: Vec<(usize, f32)> = data
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, b)| (j, (1.0 - cosine_similarity(a, b)).max(0.0)))
                .collect();
            row.sort_by(|x, y| x.1.total_cmp(&y.1).then(x.0.cmp(&y.0)));
            row.truncate(k);
            row
        })
        .collect()
}

/// Smooth-kNN membership strengths, symmetrized into an undirected edge list.
fn fuzzy_graph(knn: &[Vec<(usize, f32)>], k: usize) -> Vec<Edge> {
    let target = (k as f32).log2().max(f32::MIN_POSITIVE);
    let mean_distance = {
        let (sum, count) = knn
            .iter()
            .flatten()
            .fold((0.0f32, 0usize), |(s, c), &(_, d)| (s + d, c + 1));
        if count == 0 { 0.0 } else { sum / count as f32 }
    };

    let mut directed: HashMap<(usize, usize), f32> = HashMap::new();
    for (i, row) in knn.iter().enumerate() {
        let rho = row
            .iter()
            .map(|&(_, d)| d)
            .find(|&d| d > 0.0)
            .unwrap_or(0.0);
        let sigma = smooth_sigma(row, rho, target).max(MIN_SIGMA_SCALE * mean_distance);
        for &(j, d) in row {
            let w = if sigma > 0.0 {
                (-(d - rho).max(0.0) / sigma).exp()
            } else {
                1.0
            };
            directed.insert((i, j), w);
        }
    }

    let mut undirected: HashMap<(usize, usize), f32> = HashMap::new();
    for (&(i, j), &w) in &directed {
        let key = (i.min(j), i.max(j));
        if undirected.contains_key(&key) {
            continue;
        }
        let back = directed.get(&(j, i)).copied().unwrap_or(0.0);
        undirected.insert(key, w + back - w * back);
    }

    let mut edges: Vec<Edge> = undirected
        .into_iter()
        .filter(|&(_, w)| w > 0.0)
        .map(|((head, tail), weight)| Edge { head, tail, weight })
        .collect();
    // HashMap order is random; sort so sampling is reproducible.
    edges.sort_by(|a, b| a.head.cmp(&b.head).then(a.tail.cmp(&b.tail)));
    edges
}

/// Binary search for the bandwidth that makes the neighbourhood sum hit `target`.
fn smooth_sigma(row: &[(usize, f32)], rho: f32, target: f32) -> f32 {
    let mut lo = 0.0f32;
    let mut hi = f32::INFINITY;
    let mut mid = 1.0f32;

    for _ in 0..SIGMA_SEARCH_STEPS {
        let psum: f32 = row
            .iter()
            .map(|&(_, d)| {
                let excess = (d - rho).max(0.0);
                if excess > 0.0 {
                    (-excess / mid).exp()
                } else {
                    1.0
                }
            })
            .sum();

        if (psum - target).abs() < SIGMA_TOLERANCE {
            break;
        }
        if psum > target {
            hi = mid;
            mid = (lo + hi) / 2.0;
        } else {
            lo = mid;
            mid = if hi.is_infinite() { mid * 2.0 } else { (lo + hi) / 2.0 };
        }
    }
    mid
}
