//! # rent-predictor
//!
//! Market-rent estimation for residential flats: an offline training pipeline
//! that cleans scraped listings and fits a random forest on `log(1 + rent)`,
//! and an online prediction service that prices one flat per request with an
//! MAE-wide confidence band.
//!
//! ## Core Design Principles
//!
//! - **Fitted/unfitted split**: encoders and models are configured unfitted,
//!   and `fit` returns a separate fitted type that only knows how to predict.
//! - **Train/serve parity**: training and inference share the same field
//!   normalizers and a single [`locality::resolve`] parameterized by mode.
//! - **Immutable serving state**: a [`PredictionService`] owns one loaded
//!   [`TrainedModel`] and never mutates it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rent_predictor::{PredictionRequest, PredictionService, TrainingPipeline};
//! use rent_predictor::dataset::load_listings;
//!
//! # fn main() -> rent_predictor::Result<()> {
//! let listings = load_listings("mumbai_listings.csv")?;
//! let (model, report) = TrainingPipeline::builder().build()?.fit(&listings)?;
//! println!("hold-out MAE: {:.0}", report.metrics.mae);
//! model.save("rent_model.bin")?;
//!
//! let service = PredictionService::new(model);
//! let request = PredictionRequest::new(2, 2, 750.0, "Semi-Furnished", "Apartment")
//!     .with_locality("Andheri");
//! if let Ok(result) = service.predict(&request) {
//!     println!("{} ({})", result.predicted_rent, service.format_range(result.confidence_range));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `features`: field parsers and canonical feature records
//! - `locality`: locality resolution, merge table, support bucketing
//! - `filter`: domain plausibility rules for training rows
//! - `dataset`: CSV loading, train/test split, synthetic listings
//! - `preprocessing`: one-hot encoding and the feature encoder
//! - `model`: regression tree and random forest
//! - `trainer`: the end-to-end training pipeline
//! - `artifact`: the persisted model bundle
//! - `predict`: the per-request prediction service

pub mod artifact;
pub mod config;

/// Listing CSV loading, splitting and synthetic data.
pub mod dataset;

pub mod error;

/// Feature normalization primitives and canonical records.
pub mod features;

pub mod filter;
pub mod locality;
pub mod logging;
pub mod metrics;

/// Regression trees and forests.
pub mod model;

pub mod predict;

/// Data preprocessing transformers.
pub mod preprocessing;

pub mod serialization;
pub mod target;
pub mod trainer;

pub use artifact::TrainedModel;
pub use config::{ServiceConfig, TrainingConfig};
pub use error::{PredictorError, Result};
pub use features::{CanonicalFeatureRecord, Furnishing, PropertyType, RawListingRecord};
pub use predict::{
    PredictError, PredictionRequest, PredictionResponse, PredictionResult, PredictionService,
    ValidationError,
};
pub use trainer::{TrainingPipeline, TrainingReport};
