//! Data preprocessing transformers.
//!
//! Transformers follow a fitted/unfitted split: an unfitted [`Transformer`]
//! carries hyperparameters and learns from data, returning a
//! [`FittedTransformer`] that can transform new data and be serialized.
//!
//! # Available Transformers
//!
//! - [`OneHotEncoder`]: string categories to indicator columns
//! - [`FeatureEncoder`]: canonical feature records to the model's design
//!   matrix (one-hot categorical blocks + numeric passthrough)

pub mod feature_encoder;
pub mod one_hot;
pub mod traits;

pub use feature_encoder::{
    FeatureEncoder, FeatureEncoderParams, FittedFeatureEncoder, CATEGORICAL_FEATURES,
    NUMERIC_FEATURES,
};
pub use one_hot::{FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams};
pub use traits::{FittedTransformer, Transformer};

/// Strategy for handling unknown categories during transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HandleUnknown {
    /// Return an error when an unknown category is encountered.
    #[default]
    Error,
    /// Encode unknown categories as an all-zero block.
    Ignore,
}
