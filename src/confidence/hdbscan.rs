//! Density clustering (HDBSCAN).
//!
//! Mutual-reachability minimum spanning tree, single-linkage hierarchy,
//! condensed tree pruned at `min_cluster_size`, excess-of-mass selection.
//! Points outside every selected cluster are labelled [`NOISE`].

use tracing::debug;

/// Label for points that belong to no cluster.
pub const NOISE: i32 = -1;

/// Smallest distance used when turning a merge height into a density.
const MIN_MERGE_DISTANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdbscanConfig {
    pub min_cluster_size: usize,
    /// Neighbour count for core distances; defaults to `min_cluster_size`.
    pub min_samples: Option<usize>,
    /// Allow the root (all points) to be selected as one cluster.
    pub allow_single_cluster: bool,
}

impl Default for HdbscanConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 5,
            min_samples: None,
            allow_single_cluster: false,
        }
    }
}

impl HdbscanConfig {
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }
}

/// Clusters `points` and returns one label per point.
///
/// Labels are `0..k` in order of discovery, or [`NOISE`].
pub fn cluster(points: &[Vec<f32>], config: &HdbscanConfig) -> Vec<i32> {
    let n = points.len();
    let min_cluster_size = config.min_cluster_size.max(2);
    if n < min_cluster_size {
        return vec![NOISE; n];
    }
    let min_samples = config.min_samples.unwrap_or(min_cluster_size).clamp(1, n);

    let core = core_distances(points, min_samples);
    let mst = mutual_reachability_mst(points, &core);
    let linkage = single_linkage(n, mst);
    let tree = condense(&linkage, n, min_cluster_size);
    let selected = select_clusters(&tree, n, config.allow_single_cluster);
    let labels = label_points(&tree, n, &selected);

    debug!(
        points = n,
        clusters = selected.len(),
        noise = labels.iter().filter(|&&l| l == NOISE).count(),
        "Density clustering complete"
    );
    labels
}

#[inline]
fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Distance to the `min_samples`-th nearest point, counting the point itself.
fn core_distances(points: &[Vec<f32>], min_samples: usize) -> Vec<f64> {
    points
        .iter()
        .map(|a| {
            let mut d: Vec<f64> = points.iter().map(|b| euclidean(a, b)).collect();
            d.sort_by(f64::total_cmp);
            d[min_samples - 1]
        })
        .collect()
}

/// Prim's algorithm over the dense mutual-reachability graph.
fn mutual_reachability_mst(points: &[Vec<f32>], core: &[f64]) -> Vec<(usize, usize, f64)> {
    let n = points.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut best_from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    let mut current = 0;
    in_tree[0] = true;
    for _ in 1..n {
        let mut next = None;
        let mut next_weight = f64::INFINITY;
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            let reach = euclidean(&points[current], &points[j])
                .max(core[current])
                .max(core[j]);
            if reach < best[j] {
                best[j] = reach;
                best_from[j] = current;
            }
            if best[j] < next_weight || next.is_none() {
                next_weight = best[j];
                next = Some(j);
            }
        }
        let Some(j) = next else { break };
        in_tree[j] = true;
        edges.push((best_from[j], j, best[j]));
        current = j;
    }
    edges
}

/// One merge in the single-linkage hierarchy. Leaves are `0..n`, merges `n..2n-1`.
#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

/// Union-find over hierarchy nodes; each union creates a new node.
struct LinkageUnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
    next: usize,
}

impl LinkageUnionFind {
    fn new(n: usize) -> Self {
        let total = 2 * n - 1;
        Self {
            parent: (0..total).collect(),
            size: (0..total).map(|i| usize::from(i < n)).collect(),
            next: n,
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let up = self.parent[node];
            self.parent[node] = root;
            node = up;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) -> usize {
        let id = self.next;
        self.parent[a] = id;
        self.parent[b] = id;
        self.size[id] = self.size[a] + self.size[b];
        self.next += 1;
        id
    }
}

fn single_linkage(n: usize, mut mst: Vec<(usize, usize, f64)>) -> Vec<Merge> {
    mst.sort_by(|a, b| a.2.total_cmp(&b.2));
    let mut uf = LinkageUnionFind::new(n);
    mst.into_iter()
        .map(|(a, b, distance)| {
            let left = uf.find(a);
            let right = uf.find(b);
            let node = uf.union(left, right);
            Merge {
                left,
                right,
                distance,
                size: uf.size[node],
            }
        })
        .collect()
}

/// Condensed-tree row: `child` left `parent` at density `lambda`.
///
/// Cluster ids start at `n` (the root); point ids are `0..n`.
#[derive(Debug, Clone, Copy)]
struct CondensedRow {
    parent: usize,
    child: usize,
    lambda: f64,
    child_size: usize,
}

fn condense(linkage: &[Merge], n: usize, min_cluster_size: usize) -> Vec<CondensedRow> {
    let node_size = |node: usize| if node < n { 1 } else { linkage[node - n].size };
    let root = 2 * n - 2;

    let mut relabel = vec![0usize; 2 * n - 1];
    relabel[root] = n;
    let mut next_label = n + 1;
    let mut rows = Vec::new();
    let mut ignore = vec![false; 2 * n - 1];

    // Breadth-first from the root keeps parent labels below child labels.
    let mut queue = std::collections::VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        if node < n || ignore[node] {
            continue;
        }
        let merge = linkage[node - n];
        let lambda = 1.0 / merge.distance.max(MIN_MERGE_DISTANCE);
        let parent = relabel[node];
        let (left, right) = (merge.left, merge.right);
        let (left_size, right_size) = (node_size(left), node_size(right));

        let left_big = left_size >= min_cluster_size;
        let right_big = right_size >= min_cluster_size;

        for (child, child_size, big, other_big) in [
            (left, left_size, left_big, right_big),
            (right, right_size, right_big, left_big),
        ] {
            match (big, other_big) {
                (true, true) => {
                    relabel[child] = next_label;
                    rows.push(CondensedRow {
                        parent,
                        child: next_label,
                        lambda,
                        child_size,
                    });
                    next_label += 1;
                    queue.push_back(child);
                }
                (true, false) => {
                    relabel[child] = parent;
                    queue.push_back(child);
                }
                (false, _) => {
                    for leaf in leaves(child, n, linkage, &mut ignore) {
                        rows.push(CondensedRow {
                            parent,
                            child: leaf,
                            lambda,
                            child_size: 1,
                        });
                    }
                }
            }
        }
    }
    rows
}

/// Leaves under `node`, marking internal nodes visited so they are skipped later.
fn leaves(node: usize, n: usize, linkage: &[Merge], ignore: &mut [bool]) -> Vec<usize> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(x) = stack.pop() {
        if x < n {
            out.push(x);
        } else {
            ignore[x] = true;
            let merge = linkage[x - n];
            stack.push(merge.left);
            stack.push(merge.right);
        }
    }
    out
}

/// Excess-of-mass selection. Returns selected cluster ids, ascending.
fn select_clusters(tree: &[CondensedRow], n: usize, allow_single_cluster: bool) -> Vec<usize> {
    let Some(max_label) = tree.iter().map(|r| r.parent.max(r.child)).max() else {
        return Vec::new();
    };
    if max_label < n {
        return Vec::new();
    }
    let count = max_label - n + 1;
    let idx = |label: usize| label - n;

    let mut birth = vec![0.0f64; count];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for row in tree.iter().filter(|r| r.child >= n) {
        birth[idx(row.child)] = row.lambda;
        children[idx(row.parent)].push(row.child);
    }

    let mut stability = vec![0.0f64; count];
    for row in tree {
        stability[idx(row.parent)] += (row.lambda - birth[idx(row.parent)]) * row.child_size as f64;
    }

    let first = if allow_single_cluster { n } else { n + 1 };
    let mut is_cluster = vec![false; count];
    for label in first..=max_label {
        is_cluster[idx(label)] = true;
    }

    for label in (first..=max_label).rev() {
        let subtree: f64 = children[idx(label)]
            .iter()
            .map(|&c| stability[idx(c)])
            .sum();
        if subtree > stability[idx(label)] {
            is_cluster[idx(label)] = false;
            stability[idx(label)] = subtree;
        } else {
            let mut stack = children[idx(label)].clone();
            while let Some(c) = stack.pop() {
                is_cluster[idx(c)] = false;
                stack.extend(children[idx(c)].iter().copied());
            }
        }
    }

    (first..=max_label).filter(|&l| is_cluster[idx(l)]).collect()
}

/// Each point takes the nearest selected ancestor of the cluster it left.
fn label_points(tree: &[CondensedRow], n: usize, selected: &[usize]) -> Vec<i32> {
    let mut parent_of = std::collections::HashMap::new();
    let mut point_cluster = vec![None; n];
    for row in tree {
        if row.child < n {
            point_cluster[row.child] = Some(row.parent);
        } else {
            parent_of.insert(row.child, row.parent);
        }
    }

    point_cluster
        .into_iter()
        .map(|start| {
            let mut node = start;
            while let Some(c) = node {
                if let Ok(pos) = selected.binary_search(&c) {
                    return pos as i32;
                }
                node = parent_of.get(&c).copied();
            }
            NOISE
        })
        .collect()
}
