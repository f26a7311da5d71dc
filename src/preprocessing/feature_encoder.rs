//! Column transformer from canonical feature records to a design matrix.
//!
//! Categorical columns are one-hot encoded with unknown categories ignored;
//! numeric columns pass through unscaled. The output layout is the
//! categorical blocks in their stored order followed by the numeric columns.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{PredictorError, Result};
use crate::features::CanonicalFeatureRecord;
use crate::preprocessing::one_hot::{FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::preprocessing::HandleUnknown;

/// Categorical input columns, in encoding order.
pub const CATEGORICAL_FEATURES: [&str; 3] = ["furnishing", "property_type", "locality"];

/// Numeric passthrough columns, in output order.
pub const NUMERIC_FEATURES: [&str; 3] = ["bedrooms", "bathrooms", "area_sqft"];

fn categorical_value<'a>(record: &'a CanonicalFeatureRecord, column: &str) -> Option<&'a str> {
    match column {
        "furnishing" => Some(record.furnishing.as_str()),
        "property_type" => Some(record.property_type.as_str()),
        "locality" => Some(record.locality.as_str()),
        _ => None,
    }
}

fn numeric_value(record: &CanonicalFeatureRecord, column: &str) -> Option<f64> {
    match column {
        "bedrooms" => Some(f64::from(record.bedrooms)),
        "bathrooms" => Some(f64::from(record.bathrooms)),
        "area_sqft" => Some(record.area_sqft),
        _ => None,
    }
}

/// Unfitted column transformer over [`CanonicalFeatureRecord`]s.
#[derive(Clone, Debug)]
pub struct FeatureEncoder {
    categorical: Vec<String>,
    numeric: Vec<String>,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self {
            categorical: CATEGORICAL_FEATURES.iter().map(|s| s.to_string()).collect(),
            numeric: NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Serializable parameters for a fitted [`FeatureEncoder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoderParams {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
    pub one_hot: OneHotEncoderParams,
}

/// Fitted column transformer.
#[derive(Clone, Debug)]
pub struct FittedFeatureEncoder {
    categorical: Vec<String>,
    numeric: Vec<String>,
    one_hot: FittedOneHotEncoder,
}

fn check_columns(categorical: &[String], numeric: &[String]) -> Result<()> {
    let dummy = CanonicalFeatureRecord {
        bedrooms: 1,
        bathrooms: 1,
        area_sqft: 1.0,
        furnishing: crate::features::Furnishing::Unfurnished,
        property_type: crate::features::PropertyType::Apartment,
        locality: String::new(),
    };
    for col in categorical {
        if categorical_value(&dummy, col).is_none() {
            return Err(PredictorError::InvalidParameter(format!(
                "unknown categorical column {:?}",
                col
            )));
        }
    }
    for col in numeric {
        if numeric_value(&dummy, col).is_none() {
            return Err(PredictorError::InvalidParameter(format!(
                "unknown numeric column {:?}",
                col
            )));
        }
    }
    Ok(())
}

impl FittedFeatureEncoder {
    fn categorical_rows(&self, data: &[CanonicalFeatureRecord]) -> Vec<Vec<String>> {
        categorical_rows(&self.categorical, data)
    }

    /// Input feature names in the order the model was trained with.
    pub fn feature_order(&self) -> Vec<String> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .cloned()
            .collect()
    }

    /// Names of the encoded output columns.
    pub fn feature_names_out(&self) -> Vec<String> {
        let names: Vec<&str> = self.categorical.iter().map(String::as_str).collect();
        let mut out = self.one_hot.feature_names_out(&names);
        out.extend(self.numeric.iter().cloned());
        out
    }

    /// Categories learned for `column`, if it is categorical.
    pub fn categories_for(&self, column: &str) -> Option<&[String]> {
        self.categorical
            .iter()
            .position(|c| c == column)
            .map(|idx| self.one_hot.categories()[idx].as_slice())
    }

    /// Encode a single record into a feature vector.
    pub fn encode_one(&self, record: &CanonicalFeatureRecord) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.n_features_out()];
        let cats: Vec<&str> = self
            .categorical
            .iter()
            .filter_map(|col| categorical_value(record, col))
            .collect();
        let n_cat = self.one_hot.n_features_out();
        self.one_hot.encode_row_into(&cats, &mut out[..n_cat])?;
        for (j, col) in self.numeric.iter().enumerate() {
            out[n_cat + j] = numeric_value(record, col).unwrap_or(f64::NAN);
        }
        Ok(out)
    }
}

fn categorical_rows(columns: &[String], data: &[CanonicalFeatureRecord]) -> Vec<Vec<String>> {
    data.iter()
        .map(|record| {
            columns
                .iter()
                .filter_map(|col| categorical_value(record, col).map(str::to_string))
                .collect()
        })
        .collect()
}

impl Transformer for FeatureEncoder {
    type Input = [CanonicalFeatureRecord];
    type Output = Array2<f64>;
    type Params = FeatureEncoderParams;
    type Fitted = FittedFeatureEncoder;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted> {
        if data.is_empty() {
            return Err(PredictorError::EmptyData(
                "Cannot fit FeatureEncoder on empty data".to_string(),
            ));
        }
        check_columns(&self.categorical, &self.numeric)?;
        let one_hot = OneHotEncoder::new()
            .with_handle_unknown(HandleUnknown::Ignore)
            .fit(&categorical_rows(&self.categorical, data))?;
        Ok(FittedFeatureEncoder {
            categorical: self.categorical.clone(),
            numeric: self.numeric.clone(),
            one_hot,
        })
    }
}

impl FittedTransformer for FittedFeatureEncoder {
    type Input = [CanonicalFeatureRecord];
    type Output = Array2<f64>;
    type Params = FeatureEncoderParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output> {
        let encoded = self.one_hot.transform(&self.categorical_rows(data))?;
        let n_cat = encoded.ncols();
        let mut out = Array2::<f64>::zeros((data.len(), self.n_features_out()));
        out.slice_mut(ndarray::s![.., ..n_cat]).assign(&encoded);
        for (i, record) in data.iter().enumerate() {
            for (j, col) in self.numeric.iter().enumerate() {
                out[[i, n_cat + j]] = numeric_value(record, col).unwrap_or(f64::NAN);
            }
        }
        Ok(out)
    }

    fn extract_params(&self) -> Self::Params {
        FeatureEncoderParams {
            categorical: self.categorical.clone(),
            numeric: self.numeric.clone(),
            one_hot: self.one_hot.extract_params(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        check_columns(&params.categorical, &params.numeric)?;
        if params.one_hot.categories.len() != params.categorical.len() {
            return Err(PredictorError::FeatureMismatch {
                expected_features: params.categorical.len(),
                got_features: params.one_hot.categories.len(),
            });
        }
        Ok(Self {
            categorical: params.categorical,
            numeric: params.numeric,
            one_hot: FittedOneHotEncoder::from_params(params.one_hot)?,
        })
    }

    fn n_features_in(&self) -> usize {
        self.categorical.len() + self.numeric.len()
    }

    fn n_features_out(&self) -> usize {
        self.one_hot.n_features_out() + self.numeric.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Furnishing, PropertyType};

    fn record(locality: &str, furnishing: Furnishing, bedrooms: u32) -> CanonicalFeatureRecord {
        CanonicalFeatureRecord {
            bedrooms,
            bathrooms: bedrooms,
            area_sqft: 400.0 * bedrooms as f64,
            furnishing,
            property_type: PropertyType::Apartment,
            locality: locality.to_string(),
        }
    }

    fn training_rows() -> Vec<CanonicalFeatureRecord> {
        vec![
            record("Andheri", Furnishing::Unfurnished, 1),
            record("Worli", Furnishing::SemiFurnished, 2),
            record("Other", Furnishing::FullyFurnished, 3),
        ]
    }

    #[test]
    fn test_feature_encoder_layout() {
        let fitted = FeatureEncoder::new().fit(&training_rows()).unwrap();

        assert_eq!(fitted.n_features_in(), 6);
        // 3 furnishing + 1 property type + 3 localities + 3 numeric
        assert_eq!(fitted.n_features_out(), 10);
        assert_eq!(
            fitted.feature_names_out(),
            vec![
                "furnishing_Fully-Furnished",
                "furnishing_Semi-Furnished",
                "furnishing_Unfurnished",
                "property_type_Apartment",
                "locality_Andheri",
                "locality_Other",
                "locality_Worli",
                "bedrooms",
                "bathrooms",
                "area_sqft",
            ]
        );
        assert_eq!(
            fitted.feature_order(),
            vec![
                "bedrooms",
                "bathrooms",
                "area_sqft",
                "furnishing",
                "property_type",
                "locality"
            ]
        );
    }

    #[test]
    fn test_feature_encoder_transform_passthrough() {
        let rows = training_rows();
        let fitted = FeatureEncoder::new().fit(&rows).unwrap();
        let x = fitted.transform(&rows).unwrap();

        assert_eq!(x.shape(), &[3, 10]);
        assert_eq!(
            x.row(1).to_vec(),
            vec![0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 2.0, 2.0, 800.0]
        );
    }

    #[test]
    fn test_encode_one_matches_transform() {
        let rows = training_rows();
        let fitted = FeatureEncoder::new().fit(&rows).unwrap();
        let x = fitted.transform(&rows).unwrap();
        for (i, r) in rows.iter().enumerate() {
            assert_eq!(fitted.encode_one(r).unwrap(), x.row(i).to_vec());
        }
    }

    #[test]
    fn test_unseen_category_is_zero_block() {
        let fitted = FeatureEncoder::new().fit(&training_rows()).unwrap();
        let mut villa = record("Colaba", Furnishing::Unfurnished, 2);
        villa.property_type = PropertyType::Villa;

        let v = fitted.encode_one(&villa).unwrap();
        assert_eq!(v.len(), 10);
        // property type and locality blocks are all zero
        assert_eq!(&v[3..7], &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(&v[7..], &[2.0, 2.0, 800.0]);
    }

    #[test]
    fn test_categories_for() {
        let fitted = FeatureEncoder::new().fit(&training_rows()).unwrap();
        assert_eq!(
            fitted.categories_for("locality").unwrap(),
            &["Andheri".to_string(), "Other".to_string(), "Worli".to_string()]
        );
        assert!(fitted.categories_for("bedrooms").is_none());
    }

    #[test]
    fn test_params_roundtrip() {
        let rows = training_rows();
        let fitted = FeatureEncoder::new().fit(&rows).unwrap();
        let restored = FittedFeatureEncoder::from_params(fitted.extract_params()).unwrap();
        assert_eq!(
            restored.transform(&rows).unwrap(),
            fitted.transform(&rows).unwrap()
        );
    }

    #[test]
    fn test_params_with_unknown_column_rejected() {
        let fitted = FeatureEncoder::new().fit(&training_rows()).unwrap();
        let mut params = fitted.extract_params();
        params.numeric.push("parking".to_string());
        assert!(FittedFeatureEncoder::from_params(params).is_err());
    }
}
