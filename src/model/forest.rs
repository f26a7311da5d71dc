//! Bagged ensemble of regression trees.
//!
//! Each tree is grown on a bootstrap sample drawn with its own RNG, seeded
//! from the forest seed and the tree index, so the fitted forest does not
//! depend on how rayon schedules the work.

use std::time::Instant;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ForestConfig;
use crate::error::{PredictorError, Result};
use crate::model::tree::{DecisionTreeRegressor, FittedDecisionTree, TreeLimits, TreeParams};
use crate::model::InferenceModel;

fn tree_seed(seed: u64, tree_index: usize) -> u64 {
    seed.wrapping_add((tree_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Unfitted random forest regressor.
///
/// # Example
/// ```ignore
/// let forest = RandomForestRegressor::new(ForestConfig::default()).with_seed(42);
/// let fitted = forest.fit(&x_train, &y_train)?;
/// let y_hat = fitted.predict_batch(&x_test)?;
/// ```
#[derive(Clone, Debug)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    seed: u64,
}

impl RandomForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self { config, seed: 42 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedRandomForest> {
        let n = x.nrows();
        if n == 0 {
            return Err(PredictorError::EmptyData(
                "Cannot fit a forest on zero samples".to_string(),
            ));
        }
        if y.len() != n {
            return Err(PredictorError::InvalidParameter(format!(
                "x has {} rows but y has {} values",
                n,
                y.len()
            )));
        }
        if self.config.n_estimators == 0 {
            return Err(PredictorError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(PredictorError::InvalidParameter(
                "training data contains non-finite values".to_string(),
            ));
        }

        let limits = TreeLimits {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split.max(2),
            min_samples_leaf: self.config.min_samples_leaf.max(1),
        };
        let learner = DecisionTreeRegressor::new(limits);
        let bootstrap = self.config.bootstrap;
        let seed = self.seed;
        let x_view = x.view();
        let y_view = y.view();

        let started = Instant::now();
        let trees = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut indices: Vec<usize> = if bootstrap {
                    let mut rng = StdRng::seed_from_u64(tree_seed(seed, t));
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                learner.fit_rows(x_view, y_view, &mut indices)
            })
            .collect::<Result<Vec<_>>>()?;

        let fitted = FittedRandomForest::from_trees(trees, x.ncols());
        tracing::info!(
            n_estimators = self.config.n_estimators,
            n_samples = n,
            n_features = x.ncols(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fitted random forest"
        );
        Ok(fitted)
    }
}

/// Serializable parameters of a fitted forest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_features: usize,
    pub trees: Vec<TreeParams>,
}

/// Fitted forest; predictions are the mean over trees.
#[derive(Clone, Debug)]
pub struct FittedRandomForest {
    trees: Vec<FittedDecisionTree>,
    n_features: usize,
    importances: Vec<f64>,
}

fn normalized(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter().map(|v| v / total).collect()
    } else {
        vec![0.0; values.len()]
    }
}

impl FittedRandomForest {
    fn from_trees(trees: Vec<FittedDecisionTree>, n_features: usize) -> Self {
        let mut importances = vec![0.0; n_features];
        for tree in &trees {
            for (acc, v) in importances.iter_mut().zip(normalized(tree.raw_importances())) {
                *acc += v;
            }
        }
        let importances = normalized(&importances);
        Self {
            trees,
            n_features,
            importances,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Impurity-based importance per input column, summing to 1 unless no
    /// tree ever split.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}

impl InferenceModel for FittedRandomForest {
    type Params = ForestParams;

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_unchecked(&self, x: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_unchecked(x)).sum();
        sum / self.trees.len() as f64
    }

    fn extract_params(&self) -> ForestParams {
        ForestParams {
            n_features: self.n_features,
            trees: self.trees.iter().map(|t| t.extract_params()).collect(),
        }
    }

    fn from_params(params: ForestParams) -> Result<Self> {
        if params.trees.is_empty() {
            return Err(PredictorError::InvalidParameter(
                "forest has no trees".to_string(),
            ));
        }
        let trees = params
            .trees
            .into_iter()
            .map(FittedDecisionTree::from_params)
            .collect::<Result<Vec<_>>>()?;
        if let Some(bad) = trees.iter().find(|t| t.n_features() != params.n_features) {
            return Err(PredictorError::FeatureMismatch {
                expected_features: params.n_features,
                got_features: bad.n_features(),
            });
        }
        Ok(Self::from_trees(trees, params.n_features))
    }
}
