//! One-hot encoding for string categorical features.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{PredictorError, Result};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::preprocessing::HandleUnknown;

/// One-hot encoder for categorical string columns.
///
/// Each input column is treated as a categorical feature; the encoder learns
/// the sorted set of distinct values per column during fitting.
///
/// # Example
/// ```ignore
/// let rows = vec![vec!["Villa".to_string()], vec!["Apartment".to_string()]];
/// let fitted = OneHotEncoder::new().fit(&rows)?;
/// // categories: ["Apartment", "Villa"]
/// // encoded:    [[0, 1], [1, 0]]
/// let encoded = fitted.transform(&rows)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy for handling unknown categories.
    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }
}

/// Serializable parameters for a fitted OneHotEncoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoderParams {
    /// Sorted categories for each input column.
    pub categories: Vec<Vec<String>>,
    pub handle_unknown: HandleUnknown,
}

/// Fitted OneHotEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOneHotEncoder {
    categories: Vec<Vec<String>>,
    /// Output column offset of each input column's block.
    offsets: Vec<usize>,
    n_features_out: usize,
    handle_unknown: HandleUnknown,
}

impl FittedOneHotEncoder {
    fn from_categories(categories: Vec<Vec<String>>, handle_unknown: HandleUnknown) -> Self {
        let mut offsets = Vec::with_capacity(categories.len());
        let mut n_features_out = 0;
        for cats in &categories {
            offsets.push(n_features_out);
            n_features_out += cats.len();
        }
        Self {
            categories,
            offsets,
            n_features_out,
            handle_unknown,
        }
    }

    /// Categories learned for each input column.
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Output column names: `<input name>_<category>`.
    pub fn feature_names_out(&self, input_names: &[&str]) -> Vec<String> {
        self.categories
            .iter()
            .zip(input_names)
            .flat_map(|(cats, name)| cats.iter().map(move |cat| format!("{}_{}", name, cat)))
            .collect()
    }

    /// Write the indicator vector of one row into `out`, which must be
    /// zero-initialised and `n_features_out` long.
    pub fn encode_row_into<S: AsRef<str>>(&self, row: &[S], out: &mut [f64]) -> Result<()> {
        if row.len() != self.categories.len() {
            return Err(PredictorError::FeatureMismatch {
                expected_features: self.categories.len(),
                got_features: row.len(),
            });
        }
        for (col, value) in row.iter().enumerate() {
            let value = value.as_ref();
            // categories are sorted at fit time
            match self.categories[col].binary_search_by(|c| c.as_str().cmp(value)) {
                Ok(idx) => out[self.offsets[col] + idx] = 1.0,
                Err(_) if self.handle_unknown == HandleUnknown::Error => {
                    return Err(PredictorError::InvalidParameter(format!(
                        "Unknown category {:?} in column {}",
                        value, col
                    )));
                }
                // Ignore: leave the block as zeros
                Err(_) => {}
            }
        }
        Ok(())
    }
}

impl Transformer for OneHotEncoder {
    type Input = [Vec<String>];
    type Output = Array2<f64>;
    type Params = OneHotEncoderParams;
    type Fitted = FittedOneHotEncoder;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted> {
        let Some(first) = data.first() else {
            return Err(PredictorError::EmptyData(
                "Cannot fit OneHotEncoder on empty data".to_string(),
            ));
        };
        let cols = first.len();

        let mut sets: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); cols];
        for row in data {
            if row.len() != cols {
                return Err(PredictorError::FeatureMismatch {
                    expected_features: cols,
                    got_features: row.len(),
                });
            }
            for (col, value) in row.iter().enumerate() {
                sets[col].insert(value.as_str());
            }
        }

        let categories = sets
            .into_iter()
            .map(|set| set.into_iter().map(str::to_string).collect())
            .collect();
        Ok(FittedOneHotEncoder::from_categories(
            categories,
            self.handle_unknown,
        ))
    }
}

impl FittedTransformer for FittedOneHotEncoder {
    type Input = [Vec<String>];
    type Output = Array2<f64>;
    type Params = OneHotEncoderParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output> {
        let mut result = Array2::<f64>::zeros((data.len(), self.n_features_out));
        for (i, row) in data.iter().enumerate() {
            let mut out_row = result.row_mut(i);
            let slice = out_row
                .as_slice_mut()
                .ok_or_else(|| PredictorError::InvalidParameter("non-contiguous row".into()))?;
            self.encode_row_into(row, slice)?;
        }
        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        OneHotEncoderParams {
            categories: self.categories.clone(),
            handle_unknown: self.handle_unknown,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        for cats in &params.categories {
            if cats.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PredictorError::InvalidParameter(
                    "OneHotEncoder categories must be sorted and unique".to_string(),
                ));
            }
        }
        Ok(Self::from_categories(
            params.categories,
            params.handle_unknown,
        ))
    }

    fn n_features_in(&self) -> usize {
        self.categories.len()
    }

    fn n_features_out(&self) -> usize {
        self.n_features_out
    }
}
