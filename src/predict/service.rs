//! Infer and respond stages of the prediction service.
//!
//! [`PredictionService`] wraps one loaded [`TrainedModel`] and maps every
//! outcome to a status code and a [`PredictionResponse`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::artifact::TrainedModel;
use crate::config::{ServiceConfig, DEFAULT_CURRENCY_SYMBOL};
use crate::error::{PredictorError, Result};
use crate::features::CanonicalFeatureRecord;
use crate::predict::request::{normalize, validate, PredictionRequest, ValidationError};

/// Failure of a single prediction call.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Model error: {0}")]
    Model(#[source] PredictorError),
}

impl PredictError {
    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self {
            PredictError::Validation(_) => 400,
            PredictError::Model(_) => 500,
        }
    }
}

/// Point estimate with its error band, in whole rupees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_rent: i64,
    /// `(predicted_rent - MAE, predicted_rent + MAE)`.
    pub confidence_range: (i64, i64),
    pub locality_used: String,
}

/// Wire form of a prediction outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PredictionResponse {
    Success {
        predicted_rent: i64,
        confidence_range: String,
        locality_used: String,
    },
    Fail {
        message: String,
    },
    Error {
        message: String,
    },
}

/// Serves predictions from one loaded artifact.
///
/// Holds no mutable state; share it across threads behind an `Arc`.
#[derive(Clone, Debug)]
pub struct PredictionService {
    model: TrainedModel,
    currency_symbol: String,
}

impl PredictionService {
    pub fn new(model: TrainedModel) -> Self {
        Self {
            model,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Load the artifact named by `config`. Errors here should abort startup.
    pub fn load(config: &ServiceConfig) -> Result<Self> {
        let model = TrainedModel::load(&config.artifact_path)?;
        Ok(Self::new(model).with_currency_symbol(config.currency_symbol.clone()))
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Confidence half-width in whole rupees.
    pub fn margin(&self) -> i64 {
        self.model.mae().round() as i64
    }

    /// Validate, normalize and price one request.
    pub fn predict(
        &self,
        request: &PredictionRequest,
    ) -> std::result::Result<PredictionResult, PredictError> {
        let validated = validate(request)?;
        let record = normalize(validated);
        self.predict_record(&record)
    }

    /// Infer stage for an already-canonical record.
    pub fn predict_record(
        &self,
        record: &CanonicalFeatureRecord,
    ) -> std::result::Result<PredictionResult, PredictError> {
        let rent = self.model.predict_record(record).map_err(PredictError::Model)?;
        if !rent.is_finite() {
            return Err(PredictError::Model(PredictorError::InvalidParameter(format!(
                "model produced a non-finite rent ({})",
                rent
            ))));
        }
        let predicted_rent = rent.round() as i64;
        let margin = self.margin();
        Ok(PredictionResult {
            predicted_rent,
            confidence_range: (predicted_rent - margin, predicted_rent + margin),
            locality_used: record.locality.clone(),
        })
    }

    /// `"₹X – ₹Y"` for a confidence range.
    pub fn format_range(&self, (low, high): (i64, i64)) -> String {
        format!(
            "{sym}{} – {sym}{}",
            low,
            high,
            sym = self.currency_symbol
        )
    }

    /// Respond stage: map a raw JSON body to a status code and response.
    pub fn respond(&self, body: &Value) -> (u16, PredictionResponse) {
        let outcome = PredictionRequest::from_json(body)
            .map_err(PredictError::from)
            .and_then(|request| self.predict(&request));
        match outcome {
            Ok(result) => (
                200,
                PredictionResponse::Success {
                    predicted_rent: result.predicted_rent,
                    confidence_range: self.format_range(result.confidence_range),
                    locality_used: result.locality_used,
                },
            ),
            Err(err @ PredictError::Validation(_)) => (
                err.status_code(),
                PredictionResponse::Fail {
                    message: err.to_string(),
                },
            ),
            Err(err) => {
                tracing::error!(error = %err, "prediction failed");
                (
                    err.status_code(),
                    PredictionResponse::Error {
                        message: err.to_string(),
                    },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SyntheticListings;
    use crate::trainer::TrainingPipeline;
    use serde_json::json;
    use std::sync::{Arc, OnceLock};

    fn service() -> &'static PredictionService {
        static SERVICE: OnceLock<PredictionService> = OnceLock::new();
        SERVICE.get_or_init(|| {
            let records = SyntheticListings::new(21).records(1200);
            let (model, _) = TrainingPipeline::builder()
                .n_estimators(8)
                .max_depth(8)
                .build()
                .unwrap()
                .fit(&records)
                .unwrap();
            PredictionService::new(model)
        })
    }

    fn reference_body() -> Value {
        json!({
            "bedrooms": 2,
            "bathrooms": 2,
            "area_sqft": 750,
            "furnishing": "Semi-Furnished",
            "property_type": "Apartment",
            "locality": "Andheri"
        })
    }

    #[test]
    fn test_respond_success_reference_flat() {
        let (status, response) = service().respond(&reference_body());
        assert_eq!(status, 200);
        match response {
            PredictionResponse::Success {
                predicted_rent,
                confidence_range,
                locality_used,
            } => {
                assert!(predicted_rent > 0);
                assert_eq!(locality_used, "Andheri");
                assert!(confidence_range.starts_with('₹'));
                assert!(confidence_range.contains(" – ₹"));
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_confidence_range_uses_mae() {
        let svc = service();
        let req = PredictionRequest::new(2, 2, 750.0, "Semi-Furnished", "Apartment")
            .with_locality("Andheri");
        let result = svc.predict(&req).unwrap();
        let margin = svc.margin();
        assert!(margin > 0);
        assert_eq!(
            result.confidence_range,
            (result.predicted_rent - margin, result.predicted_rent + margin)
        );
        assert_eq!(
            svc.format_range(result.confidence_range),
            format!(
                "₹{} – ₹{}",
                result.predicted_rent - margin,
                result.predicted_rent + margin
            )
        );
    }

    #[test]
    fn test_respond_fail_is_400_with_field_name() {
        let mut body = reference_body();
        body["area_sqft"] = json!(300);
        let (status, response) = service().respond(&body);
        assert_eq!(status, 400);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "fail");
        assert!(value["message"].as_str().unwrap().contains("area_sqft"));
    }

    #[test]
    fn test_respond_missing_field() {
        let mut body = reference_body();
        body.as_object_mut().unwrap().remove("furnishing");
        let (status, response) = service().respond(&body);
        assert_eq!(status, 400);
        assert_eq!(
            response,
            PredictionResponse::Fail {
                message: "Missing field: furnishing".to_string()
            }
        );
    }

    #[test]
    fn test_success_response_wire_shape() {
        let (_, response) = service().respond(&reference_body());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "success");
        assert!(value["predicted_rent"].is_i64());
        assert!(value["confidence_range"].is_string());
        assert_eq!(value["locality_used"], "Andheri");
    }

    #[test]
    fn test_predict_is_deterministic() {
        let svc = service();
        let req = PredictionRequest::new(3, 2, 1250.0, "Unfurnished", "Apartment")
            .with_address("Near station, Powai");
        let first = svc.predict(&req).unwrap();
        for _ in 0..10 {
            assert_eq!(svc.predict(&req).unwrap(), first);
        }
        assert_eq!(first.locality_used, "Powai");
    }

    #[test]
    fn test_unrecognised_locality_reports_other() {
        let req = PredictionRequest::new(2, 2, 800.0, "Unfurnished", "Apartment")
            .with_locality("Nashik");
        let result = service().predict(&req).unwrap();
        assert_eq!(result.locality_used, "Other");
        assert!(result.predicted_rent > 0);
    }

    #[test]
    fn test_concurrent_predictions_agree() {
        let svc = Arc::new(service().clone());
        let req = PredictionRequest::new(2, 2, 750.0, "Semi-Furnished", "Apartment")
            .with_locality("Andheri");
        let expected = svc.predict(&req).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let svc = Arc::clone(&svc);
                let req = req.clone();
                std::thread::spawn(move || svc.predict(&req).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_currency_symbol_override() {
        let svc = service().clone().with_currency_symbol("Rs.");
        assert_eq!(svc.format_range((100, 200)), "Rs.100 – Rs.200");
    }

    #[test]
    fn test_load_missing_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::new(dir.path().join("missing.bin"));
        assert!(PredictionService::load(&config).is_err());
    }
}
