//! Core traits for preprocessing transformers.
//!
//! - [`Transformer`]: unfitted, holds hyperparameters and learns from data.
//! - [`FittedTransformer`]: learned state, ready for inference and serialization.

use crate::error::Result;
use crate::serialization::SerializableParams;

/// Trait for unfitted transformers with hyperparameters.
///
/// # Example
/// ```ignore
/// use rent_predictor::preprocessing::{OneHotEncoder, Transformer, FittedTransformer};
///
/// let fitted = OneHotEncoder::new().fit(&rows)?;
/// let encoded = fitted.transform(&new_rows)?;
/// ```
pub trait Transformer: Clone {
    /// Input data type for transformation.
    type Input: ?Sized;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<
        Params = Self::Params,
        Input = Self::Input,
        Output = Self::Output,
    >;

    /// Fit the transformer to the training data.
    ///
    /// # Errors
    /// Returns [`crate::PredictorError`] if the data is empty or has an
    /// incompatible shape.
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted>;
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `transform` never mutates learned state, so a fitted transformer can be
///   shared across threads.
pub trait FittedTransformer: Clone + Sized {
    type Input: ?Sized;
    type Output;
    type Params: SerializableParams;

    /// Transform data using learned parameters.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self>;

    /// Number of input columns seen during fit.
    fn n_features_in(&self) -> usize;

    /// Number of output columns produced by `transform`.
    fn n_features_out(&self) -> usize;
}
