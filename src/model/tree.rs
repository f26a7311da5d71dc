//! CART regression tree with a squared-error split criterion.
//!
//! Nodes are stored in a flat arena in pre-order; the root is node 0.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{PredictorError, Result};
use crate::model::InferenceModel;

/// A node of a fitted regression tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Samples with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeLimits {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self {
            max_depth: 18,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Unfitted regression tree.
#[derive(Clone, Debug, Default)]
pub struct DecisionTreeRegressor {
    limits: TreeLimits,
}

impl DecisionTreeRegressor {
    pub fn new(limits: TreeLimits) -> Self {
        Self { limits }
    }

    /// Fit on every row of `x`.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedDecisionTree> {
        let mut indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x.view(), y.view(), &mut indices)
    }

    /// Fit on the rows named by `indices`; repeated indices act as sample weights.
    pub fn fit_rows<'a>(
        &self,
        x: ArrayView2<'a, f64>,
        y: ArrayView1<'a, f64>,
        indices: &mut [usize],
    ) -> Result<FittedDecisionTree> {
        if x.nrows() != y.len() {
            return Err(PredictorError::InvalidParameter(format!(
                "x has {} rows but y has {} values",
                x.nrows(),
                y.len()
            )));
        }
        if indices.is_empty() {
            return Err(PredictorError::EmptyData(
                "Cannot fit a tree on zero samples".to_string(),
            ));
        }
        let mut builder = Builder {
            x,
            y,
            limits: self.limits,
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
        };
        builder.grow(indices, 0);
        Ok(FittedDecisionTree {
            nodes: builder.nodes,
            n_features: x.ncols(),
            importances: builder.importances,
        })
    }
}

struct Builder<'a> {
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    limits: TreeLimits,
    nodes: Vec<Node>,
    /// Unnormalized squared-error decrease per feature.
    importances: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl Builder<'_> {
    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let n = indices.len();
        let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| {
            let v = self.y[i];
            (s + v, sq + v * v)
        });
        let mean = sum / n as f64;
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: mean,
            n_samples: n,
        });

        let parent_sse = sum_sq - sum * sum / n as f64;
        if depth >= self.limits.max_depth
            || n < self.limits.min_samples_split
            || n < 2 * self.limits.min_samples_leaf
            || parent_sse <= 1e-12
        {
            return node_id;
        }

        let Some(best) = self.best_split(indices, sum) else {
            return node_id;
        };
        self.importances[best.feature] += best.gain;

        let mut split_at = 0;
        for k in 0..n {
            if self.x[[indices[k], best.feature]] <= best.threshold {
                indices.swap(k, split_at);
                split_at += 1;
            }
        }
        let (left_rows, right_rows) = indices.split_at_mut(split_at);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[node_id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_id
    }

    /// Exhaustive search over every feature and every boundary between
    /// distinct values. Ties keep the lowest feature index.
    fn best_split(&self, indices: &[usize], total_sum: f64) -> Option<BestSplit> {
        let n = indices.len();
        let min_leaf = self.limits.min_samples_leaf;
        let parent_score = total_sum * total_sum / n as f64;
        let mut best: Option<BestSplit> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature in 0..self.x.ncols() {
            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (self.x[[i, feature]], self.y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            if pairs[0].0 == pairs[n - 1].0 {
                continue;
            }

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += pairs[k].1;
                if pairs[k].0 == pairs[k + 1].0 {
                    continue;
                }
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let right_sum = total_sum - left_sum;
                let score = left_sum * left_sum / n_left as f64
                    + right_sum * right_sum / n_right as f64;
                let gain = score - parent_score;
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    // adjacent floats can round the midpoint up to the upper value
                    let mut threshold = 0.5 * (pairs[k].0 + pairs[k + 1].0);
                    if threshold >= pairs[k + 1].0 {
                        threshold = pairs[k].0;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }
}

/// Serializable parameters of a fitted tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub nodes: Vec<Node>,
    pub n_features: usize,
    pub importances: Vec<f64>,
}

/// Fitted regression tree.
#[derive(Clone, Debug)]
pub struct FittedDecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    importances: Vec<f64>,
}

impl FittedDecisionTree {
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Depth of the deepest leaf (a lone root has depth 0).
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }

    /// Squared-error decrease attributed to each feature (unnormalized).
    pub fn raw_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Evaluate a feature vector whose length has already been checked.
    fn eval(&self, x: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { value, .. } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if x[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

impl InferenceModel for FittedDecisionTree {
    type Params = TreeParams;

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_unchecked(&self, x: &[f64]) -> f64 {
        self.eval(x)
    }

    fn extract_params(&self) -> TreeParams {
        TreeParams {
            nodes: self.nodes.clone(),
            n_features: self.n_features,
            importances: self.importances.clone(),
        }
    }

    fn from_params(params: TreeParams) -> Result<Self> {
        let n_nodes = params.nodes.len();
        if n_nodes == 0 {
            return Err(PredictorError::InvalidParameter(
                "tree has no nodes".to_string(),
            ));
        }
        for (id, node) in params.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                // pre-order arena: children always come after their parent
                if feature >= params.n_features
                    || left <= id
                    || right <= id
                    || left >= n_nodes
                    || right >= n_nodes
                {
                    return Err(PredictorError::InvalidParameter(format!(
                        "malformed split at node {}",
                        id
                    )));
                }
            }
        }
        if params.importances.len() != params.n_features {
            return Err(PredictorError::FeatureMismatch {
                expected_features: params.n_features,
                got_features: params.importances.len(),
            });
        }
        Ok(Self {
            nodes: params.nodes,
            n_features: params.n_features,
            importances: params.importances,
        })
    }
}
