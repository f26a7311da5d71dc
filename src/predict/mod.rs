//! Online prediction: `Validate → Normalize → Infer → Respond` per request.
//!
//! A [`PredictionService`] is built once from a loaded artifact and is
//! read-only afterwards, so any number of threads may call it concurrently.

pub mod request;
pub mod service;

pub use request::{
    normalize, validate, PredictionRequest, ValidatedRequest, ValidationError, MIN_AREA_SQFT,
};
pub use service::{PredictError, PredictionResponse, PredictionResult, PredictionService};
