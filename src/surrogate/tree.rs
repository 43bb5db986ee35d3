//! CART regression tree surrogate.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Surrogate;
use crate::error::{Error, Result};
use crate::points::Points;
use crate::rng_util;

/// Settings for [`TreeSurrogate`].
///
/// # Examples
///
/// ```
/// use calibrator::surrogate::TreeConfig;
///
/// let config = TreeConfig::new().max_depth(3).min_samples_leaf(2).seed(7);
/// assert_eq!(config.max_depth, 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeConfig {
    /// Maximum depth; the root is depth 0 (default: 5).
    pub max_depth: usize,
    /// Minimum samples required to split a node (default: 2).
    pub min_samples_split: usize,
    /// Minimum samples required in each leaf (default: 1).
    pub min_samples_leaf: usize,
    /// Seed for the feature visiting order (default: 0).
    pub seed: u64,
}

impl TreeConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum depth.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the minimum number of samples needed to split a node.
    #[must_use]
    pub fn min_samples_split(mut self, n: usize) -> Self {
        self.min_samples_split = n;
        self
    }

    /// Sets the minimum number of samples per leaf.
    #[must_use]
    pub fn min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }

    /// Sets the seed that orders feature evaluation.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let reason = if self.max_depth == 0 {
            "max_depth must be at least 1"
        } else if self.min_samples_split < 2 {
            "min_samples_split must be at least 2"
        } else if self.min_samples_leaf == 0 {
            "min_samples_leaf must be at least 1"
        } else {
            return Ok(());
        };
        Err(Error::InvalidFamilyConfig {
            family: "tree",
            reason: reason.to_owned(),
        })
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 0,
        }
    }
}

/// A node in the regression tree (arena-allocated).
#[derive(Clone, Debug)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree.
///
/// Splits minimize the summed squared error of the two children, with
/// thresholds at midpoints between consecutive distinct feature values.
/// Features are visited in a random order drawn from the configured seed,
/// and the first strictly best split wins, so a given seed always grows the
/// same tree.
#[derive(Clone, Debug)]
pub struct TreeSurrogate {
    nodes: Vec<TreeNode>,
}

impl TreeSurrogate {
    /// Grows a tree on `y` over the rows of `x`.
    ///
    /// An empty sample yields a single leaf predicting 0.
    ///
    /// # Panics
    ///
    /// Panics if `x` and `y` have different lengths.
    #[must_use]
    pub fn fit(x: &Points, y: &[f64], config: &TreeConfig) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have the same length");

        let mut tree = Self { nodes: Vec::new() };
        if y.is_empty() {
            tree.nodes.push(TreeNode::Leaf { value: 0.0 });
            return tree;
        }

        let mut rng = fastrand::Rng::with_seed(config.seed);
        let indices: Vec<usize> = (0..y.len()).collect();
        tree.build_node(x, y, &indices, 0, config, &mut rng);
        tree
    }

    #[allow(clippy::cast_precision_loss)]
    fn build_node(
        &mut self,
        x: &Points,
        y: &[f64],
        indices: &[usize],
        depth: usize,
        config: &TreeConfig,
        rng: &mut fastrand::Rng,
    ) -> usize {
        let n = indices.len();
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n as f64;

        if n < config.min_samples_split || depth >= config.max_depth {
            return self.push_leaf(mean);
        }

        let total_sse: f64 = indices.iter().map(|&i| (y[i] - mean).powi(2)).sum();
        if total_sse <= 0.0 {
            return self.push_leaf(mean);
        }

        let mut best: Option<(f64, usize, f64)> = None;
        for feature in rng_util::permutation(rng, x.n_dims()) {
            let candidate =
                best_split_for_feature(x, y, indices, feature, config.min_samples_leaf, total_sse);
            if let Some((threshold, score)) = candidate
                && best.is_none_or(|(best_score, _, _)| score > best_score)
            {
                best = Some((score, feature, threshold));
            }
        }

        let Some((score, feature, threshold)) = best else {
            return self.push_leaf(mean);
        };
        if score <= 0.0 {
            return self.push_leaf(mean);
        }

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x.row(i)[feature] <= threshold);
        if left_indices.is_empty() || right_indices.is_empty() {
            return self.push_leaf(mean);
        }

        // Reserve slot for this split node (placeholder replaced below)
        let node_idx = self.push_leaf(0.0);
        let left = self.build_node(x, y, &left_indices, depth + 1, config, rng);
        let right = self.build_node(x, y, &right_indices, depth + 1, config, rng);
        self.nodes[node_idx] = TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_idx
    }

    fn push_leaf(&mut self, value: f64) -> usize {
        self.nodes.push(TreeNode::Leaf { value });
        self.nodes.len() - 1
    }

    /// Depth of the deepest leaf (a lone leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth_at(0)
    }

    fn depth_at(&self, idx: usize) -> usize {
        match self.nodes[idx] {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => {
                1 + self.depth_at(left).max(self.depth_at(right))
            }
        }
    }

    /// Number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }
}

impl Surrogate for TreeSurrogate {
    fn predict_one(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Best `(threshold, sse_reduction)` on one feature, by a sorted sweep.
#[allow(clippy::cast_precision_loss)]
fn best_split_for_feature(
    x: &Points,
    y: &[f64],
    indices: &[usize],
    feature: usize,
    min_samples_leaf: usize,
    total_sse: f64,
) -> Option<(f64, f64)> {
    let mut pairs: Vec<(f64, f64)> = indices.iter().map(|&i| (x.row(i)[feature], y[i])).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = pairs.len();
    let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
    let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();

    let (mut l_sum, mut l_sq) = (0.0, 0.0);
    let mut best: Option<(f64, f64)> = None;
    for k in 0..n.saturating_sub(1) {
        let (value, target) = pairs[k];
        l_sum += target;
        l_sq += target * target;

        let next_value = pairs[k + 1].0;
        if value >= next_value {
            continue;
        }
        let l_n = k + 1;
        let r_n = n - l_n;
        if l_n < min_samples_leaf || r_n < min_samples_leaf {
            continue;
        }

        let r_sum = total_sum - l_sum;
        let r_sq = total_sq - l_sq;
        let l_sse = l_sq - l_sum * l_sum / l_n as f64;
        let r_sse = r_sq - r_sum * r_sum / r_n as f64;
        let score = total_sse - l_sse - r_sse;

        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((f64::midpoint(value, next_value), score));
        }
    }
    best
}
