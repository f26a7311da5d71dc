//! Regression models.
//!
//! Unfitted models hold hyperparameters and produce a fitted counterpart;
//! fitted models implement [`InferenceModel`] and are read-only afterwards.

pub mod forest;
pub mod tree;

pub use forest::{FittedRandomForest, ForestParams, RandomForestRegressor};
pub use tree::{DecisionTreeRegressor, FittedDecisionTree, Node, TreeLimits, TreeParams};

use ndarray::{Array1, Array2};

use crate::error::{PredictorError, Result};
use crate::serialization::SerializableParams;

/// Read-only prediction over dense feature vectors.
pub trait InferenceModel: Sized {
    type Params: SerializableParams;

    /// Width of the feature vectors the model was fitted on.
    fn n_features(&self) -> usize;

    /// Predict for a vector already known to be `n_features` long.
    fn predict_unchecked(&self, x: &[f64]) -> f64;

    fn extract_params(&self) -> Self::Params;

    fn from_params(params: Self::Params) -> Result<Self>;

    fn predict(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.n_features() {
            return Err(PredictorError::FeatureMismatch {
                expected_features: self.n_features(),
                got_features: x.len(),
            });
        }
        Ok(self.predict_unchecked(x))
    }

    fn predict_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features() {
            return Err(PredictorError::FeatureMismatch {
                expected_features: self.n_features(),
                got_features: x.ncols(),
            });
        }
        Ok(x.outer_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => self.predict_unchecked(slice),
                None => self.predict_unchecked(&row.to_vec()),
            })
            .collect())
    }
}
