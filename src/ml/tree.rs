// ============================================================
// Layer 5 — Regression Tree (CART, squared error)
// ============================================================
// A binary tree grown greedily: at each node pick the feature
// and threshold that minimise the summed squared error of the
// two children.
//
// For a node with n samples and target sum S, splitting into
// (n_l, S_l) and (n_r, S_r) reduces the squared error by an
// amount that grows with
//
//     S_l² / n_l + S_r² / n_r
//
// so that proxy is maximised instead of recomputing variances.
// Thresholds sit at the midpoint between adjacent distinct
// feature values. Rows with `x[f] <= threshold` go left.
//
// Nodes live in a flat Vec; children are indices. The tree is
// built with an explicit work stack so deep trees cannot
// overflow the call stack.

use ndarray::{ArrayView1, ArrayView2};
use rand::{rngs::StdRng, seq::index::sample};
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};

/// Growth limits for a single tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth:         Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf:  usize,
    /// Number of features drawn as split candidates at every node
    pub max_features:      usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes:      Vec<Node>,
    n_features: usize,
}

/// Pending node: slot to fill, rows that reach it, depth
struct Work {
    slot:    usize,
    rows:    Vec<usize>,
    depth:   usize,
}

struct BestSplit {
    feature:   usize,
    threshold: f64,
    score:     f64,
}

impl RegressionTree {
    /// Grow a tree on the given rows of `x`/`y`. `rows` may contain
    /// duplicates (bootstrap samples).
    pub fn fit(
        x:      ArrayView2<'_, f64>,
        y:      ArrayView1<'_, f64>,
        rows:   Vec<usize>,
        params: &TreeParams,
        rng:    &mut StdRng,
    ) -> Self {
        let n_features = x.ncols();
        let mut nodes  = vec![Node::Leaf { value: mean(y, &rows) }];
        let mut stack  = vec![Work { slot: 0, rows, depth: 0 }];

        while let Some(work) = stack.pop() {
            let value = mean(y, &work.rows);

            let can_split = work.rows.len() >= params.min_samples_split
                && work.rows.len() >= 2 * params.min_samples_leaf
                && params.max_depth.map_or(true, |d| work.depth < d)
                && !is_constant(y, &work.rows);

            let best = if can_split {
                best_split(x, y, &work.rows, params, rng)
            } else {
                None
            };

            let Some(best) = best else {
                nodes[work.slot] = Node::Leaf { value };
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = work
                .rows
                .iter()
                .partition(|&&r| x[[r, best.feature]] <= best.threshold);

            let left  = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[work.slot] = Node::Split {
                feature:   best.feature,
                threshold: best.threshold,
                left,
                right,
            };

            stack.push(Work { slot: right, rows: right_rows, depth: work.depth + 1 });
            stack.push(Work { slot: left,  rows: left_rows,  depth: work.depth + 1 });
        }

        Self { nodes, n_features }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    i = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((i, depth)) = stack.pop() {
            match self.nodes.get(i) {
                Some(Node::Split { left, right, .. }) => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
                _ => deepest = deepest.max(depth),
            }
        }
        deepest
    }

    /// Check the layout `fit` produces: every child index lies after
    /// its parent and inside the node list, and every split feature
    /// exists. A tree read from disk must pass before it is walked.
    pub fn validate(&self) -> PipelineResult<()> {
        let n_nodes = self.nodes.len();
        if n_nodes == 0 {
            return Err(PipelineError::CorruptModel("tree has no nodes".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let Node::Split { feature, left, right, .. } = node else {
                continue;
            };
            for child in [*left, *right] {
                if child <= i || child >= n_nodes {
                    return Err(PipelineError::CorruptModel(format!(
                        "node {i} points to child {child}, expected {}..{n_nodes}",
                        i + 1
                    )));
                }
            }
            if *feature >= self.n_features {
                return Err(PipelineError::CorruptModel(format!(
                    "node {i} splits on feature {feature} but the tree has {} features",
                    self.n_features
                )));
            }
        }
        Ok(())
    }
}

fn mean(y: ArrayView1<'_, f64>, rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&r| y[r]).sum::<f64>() / rows.len() as f64
}

fn is_constant(y: ArrayView1<'_, f64>, rows: &[usize]) -> bool {
    match rows.first() {
        Some(&first) => rows.iter().all(|&r| y[r] == y[first]),
        None => true,
    }
}

fn best_split(
    x:      ArrayView2<'_, f64>,
    y:      ArrayView1<'_, f64>,
    rows:   &[usize],
    params: &TreeParams,
    rng:    &mut StdRng,
) -> Option<BestSplit> {
    let n_features = x.ncols();
    let candidates: Vec<usize> = if params.max_features >= n_features {
        (0..n_features).collect()
    } else {
        sample(rng, n_features, params.max_features.max(1)).into_vec()
    };

    let n     = rows.len();
    let total = rows.iter().map(|&r| y[r]).sum::<f64>();
    let min_leaf = params.min_samples_leaf.max(1);

    let mut best: Option<BestSplit> = None;
    let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

    for feature in candidates {
        pairs.clear();
        pairs.extend(rows.iter().map(|&r| (x[[r, feature]], y[r])));
        pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        if pairs[0].0 == pairs[n - 1].0 {
            continue;
        }

        let mut left_sum = 0.0;
        for pos in 1..n {
            left_sum += pairs[pos - 1].1;

            let (lo, hi) = (pairs[pos - 1].0, pairs[pos].0);
            if lo == hi || pos < min_leaf || n - pos < min_leaf {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / pos as f64
                + right_sum * right_sum / (n - pos) as f64;

            if best.as_ref().map_or(true, |b| score > b.score) {
                let mid = lo + (hi - lo) / 2.0;
                let threshold = if mid < hi { mid } else { lo };
                best = Some(BestSplit { feature, threshold, score });
            }
        }
    }

    best
}
