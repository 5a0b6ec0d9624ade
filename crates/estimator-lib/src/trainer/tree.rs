//! CART regression trees on squared error
//!
//! Nodes live in an arena indexed from the root at 0. Growth is best-first:
//! the open leaf whose best split reduces squared error the most is split
//! next, until the leaf budget is spent or no leaf can be split. With an
//! unbounded leaf budget this yields the same tree as depth-first growth.

use super::FitError;
use serde::{Deserialize, Serialize};

/// Splits must reduce squared error by more than this
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Rows with `row[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        value: f64,
    },
    Leaf { value: f64 },
}

impl Node {
    /// Mean target of the training rows that reached this node
    pub fn value(&self) -> f64 {
        match self {
            Node::Split { value, .. } | Node::Leaf { value } => *value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn root_value(&self) -> f64 {
        self.nodes.first().map_or(0.0, Node::value)
    }

    fn leaf_path<'a>(
        &'a self,
        row: &'a [f64],
    ) -> impl Iterator<Item = (Option<usize>, usize)> + 'a {
        let mut current = Some((None, 0usize));
        std::iter::from_fn(move || {
            let (feature, idx) = current?;
            current = match &self.nodes[idx] {
                Node::Split {
                    feature: f,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let next = if row[*f] <= *threshold { *left } else { *right };
                    Some((Some(*f), next))
                }
                Node::Leaf { .. } => None,
            };
            Some((feature, idx))
        })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.leaf_path(row)
            .last()
            .map_or(0.0, |(_, idx)| self.nodes[idx].value())
    }

    /// Path attribution: credit each split feature with the change in node
    /// mean along the decision path, scaled by `scale`
    ///
    /// Returns the scaled root value; it plus the added contributions equals
    /// the scaled prediction.
    pub fn add_contributions(&self, row: &[f64], scale: f64, out: &mut [f64]) -> f64 {
        let mut previous = self.root_value();
        for (feature, idx) in self.leaf_path(row) {
            let value = self.nodes[idx].value();
            if let Some(f) = feature {
                out[f] += scale * (value - previous);
            }
            previous = value;
        }
        scale * self.root_value()
    }
}

/// Growth limits for one tree
#[derive(Debug, Clone)]
pub(crate) struct TreeParams {
    pub max_depth: usize,
    pub max_leaves: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

struct OpenLeaf {
    node: usize,
    depth: usize,
    split: SplitCandidate,
}

fn mean(y: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

/// Best squared-error split of `indices` over the candidate `features`
///
/// Ties keep the first candidate in feature order, then threshold order.
fn find_split(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    features: &[usize],
    min_samples_leaf: usize,
) -> Option<SplitCandidate> {
    let n = indices.len();
    if n < 2 {
        return None;
    }
    let total: f64 = indices.iter().map(|&i| y[i]).sum();
    let parent = total * total / n as f64;

    let mut best: Option<(usize, f64, f64)> = None;
    let mut order = indices.to_vec();
    for &feature in features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
        let mut left_sum = 0.0;
        for k in 0..n - 1 {
            left_sum += y[order[k]];
            let (n_left, n_right) = (k + 1, n - k - 1);
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }
            let here = x[order[k]][feature];
            let next = x[order[k + 1]][feature];
            if next <= here {
                continue;
            }
            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64
                - parent;
            if gain > best.map_or(MIN_GAIN, |(_, _, g)| g) {
                let mid = here + (next - here) / 2.0;
                let threshold = if mid < next { mid } else { here };
                best = Some((feature, threshold, gain));
            }
        }
    }

    let (feature, threshold, gain) = best?;
    let (left, right) = indices.iter().partition(|&&i| x[i][feature] <= threshold);
    Some(SplitCandidate {
        feature,
        threshold,
        gain,
        left,
        right,
    })
}

/// Grow one tree on the rows in `indices` using only `features`
pub(crate) fn grow(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    features: &[usize],
    params: &TreeParams,
) -> Result<RegressionTree, FitError> {
    if indices.is_empty() {
        return Err(FitError::EmptyTrainingSet);
    }
    if params.max_leaves < 1 {
        return Err(FitError::InvalidParameter("max_leaves must be at least 1".into()));
    }

    let mut nodes = vec![Node::Leaf {
        value: mean(y, indices),
    }];
    let mut open: Vec<OpenLeaf> = Vec::new();
    let try_open = |node: usize, depth: usize, rows: &[usize], open: &mut Vec<OpenLeaf>| {
        if depth >= params.max_depth || rows.len() < params.min_samples_split.max(2) {
            return;
        }
        if let Some(split) = find_split(x, y, rows, features, params.min_samples_leaf.max(1)) {
            open.push(OpenLeaf { node, depth, split });
        }
    };
    try_open(0, 0, indices, &mut open);

    let mut leaves = 1;
    while leaves < params.max_leaves {
        let mut pick: Option<usize> = None;
        for (i, leaf) in open.iter().enumerate() {
            if pick.map_or(true, |p| leaf.split.gain > open[p].split.gain) {
                pick = Some(i);
            }
        }
        let Some(pick) = pick else { break };
        let OpenLeaf { node, depth, split } = open.remove(pick);

        let left = nodes.len();
        let right = left + 1;
        nodes.push(Node::Leaf {
            value: mean(y, &split.left),
        });
        nodes.push(Node::Leaf {
            value: mean(y, &split.right),
        });
        let value = nodes[node].value();
        nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            value,
        };
        leaves += 1;

        try_open(left, depth + 1, &split.left, &mut open);
        try_open(right, depth + 1, &split.right, &mut open);
    }

    Ok(RegressionTree { nodes })
}
