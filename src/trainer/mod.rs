// trainer/mod.rs
//! Offline training run: raw listings in, [`TrainedModel`] and a
//! [`TrainingReport`] out.

use std::time::Instant;

use tracing::{debug, info};

use crate::artifact::{ArtifactMetadata, TrainedModel, FORMAT_VERSION};
use crate::config::{FilterBounds, TrainingConfig};
use crate::dataset::train_test_split;
use crate::error::Result;
use crate::features::{
    CanonicalFeatureRecord, Furnishing, LabeledRecord, ListingDraft, PropertyType,
    RawListingRecord,
};
use crate::filter::{ensure_min_rows, DomainFilter, FilterReport};
use crate::locality::{resolve, LocalityVocabulary, ResolveMode};
use crate::metrics::{Metrics, RegressionMetrics};
use crate::model::{InferenceModel, RandomForestRegressor};
use crate::preprocessing::{FeatureEncoder, FittedTransformer, Transformer};
use crate::target;

/// Number of entries kept in the report's ranked lists.
const REPORT_TOP_N: usize = 10;

/// The flat every training run is sanity-checked against.
pub fn reference_flat() -> CanonicalFeatureRecord {
    CanonicalFeatureRecord {
        bedrooms: 2,
        bathrooms: 2,
        area_sqft: 750.0,
        furnishing: Furnishing::SemiFurnished,
        property_type: PropertyType::Apartment,
        locality: "Andheri".to_string(),
    }
}

/// Summary of one training run.
#[derive(Clone, Debug)]
pub struct TrainingReport {
    pub filter: FilterReport,
    pub rows_train: usize,
    pub rows_test: usize,
    pub metrics: RegressionMetrics,
    /// Most important encoded features, highest first.
    pub top_features: Vec<(String, f64)>,
    /// Most frequent localities after support bucketing.
    pub top_localities: Vec<(String, usize)>,
    /// Predicted rent of [`reference_flat`].
    pub reference_prediction: f64,
    pub elapsed_secs: f64,
}

// --- Pipeline (immutable after build) ---
#[derive(Clone, Debug)]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

// --- Builder ---
#[derive(Clone, Debug, Default)]
pub struct TrainingPipelineBuilder {
    config: TrainingConfig,
}

impl TrainingPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration; later setters still apply on top.
    pub fn config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn n_estimators(mut self, n: usize) -> Self {
        self.config.forest.n_estimators = n;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.forest.max_depth = depth;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn test_ratio(mut self, ratio: f64) -> Self {
        self.config.test_ratio = ratio;
        self
    }

    pub fn min_locality_support(mut self, support: usize) -> Self {
        self.config.min_locality_support = support;
        self
    }

    pub fn min_rows(mut self, rows: usize) -> Self {
        self.config.min_rows = rows;
        self
    }

    pub fn bounds(mut self, bounds: FilterBounds) -> Self {
        self.config.bounds = bounds;
        self
    }

    pub fn build(self) -> Result<TrainingPipeline> {
        self.config.validate()?;
        Ok(TrainingPipeline {
            config: self.config,
        })
    }
}

impl TrainingPipeline {
    pub fn builder() -> TrainingPipelineBuilder {
        TrainingPipelineBuilder::new()
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Resolve localities, bucket rare ones, parse fields and filter.
    ///
    /// Support counts are taken over every row before filtering.
    pub fn clean(
        &self,
        records: &[RawListingRecord],
    ) -> (Vec<LabeledRecord>, FilterReport, LocalityVocabulary) {
        let labels: Vec<String> = records
            .iter()
            .map(|r| resolve(r.locality.as_deref(), ResolveMode::Training))
            .collect();
        let vocabulary = LocalityVocabulary::fit(
            labels.iter().map(String::as_str),
            self.config.min_locality_support,
        );
        debug!(
            distinct = labels.iter().collect::<std::collections::HashSet<_>>().len(),
            supported = vocabulary.supported().count(),
            min_support = vocabulary.min_support(),
            "locality vocabulary fitted"
        );

        let drafts: Vec<ListingDraft> = records
            .iter()
            .zip(&labels)
            .map(|(raw, label)| ListingDraft::from_raw(raw, vocabulary.bucket(label)))
            .collect();
        let (kept, report) = DomainFilter::new(self.config.bounds.clone()).apply(drafts);
        (kept, report, vocabulary)
    }

    /// Run the full pipeline.
    ///
    /// # Errors
    /// [`crate::PredictorError::InsufficientData`] when fewer than
    /// `min_rows` rows survive cleaning; any encoder or model fitting error.
    pub fn fit(&self, records: &[RawListingRecord]) -> Result<(TrainedModel, TrainingReport)> {
        let started = Instant::now();
        let config = &self.config;
        info!(rows = records.len(), "training started");

        let (kept, filter_report, vocabulary) = self.clean(records);
        ensure_min_rows(filter_report.kept, config.min_rows)?;

        let split = train_test_split(kept.len(), config.test_ratio, config.seed)?;
        let gather = |indices: &[usize]| -> (Vec<CanonicalFeatureRecord>, Vec<f64>) {
            indices
                .iter()
                .map(|&i| (kept[i].features.clone(), kept[i].rent))
                .unzip()
        };
        let (train_x, train_rent) = gather(&split.train);
        let (test_x, test_rent) = gather(&split.test);
        debug!(train = train_x.len(), test = test_x.len(), "split dataset");

        let encoder = FeatureEncoder::new().fit(&train_x)?;
        let x_train = encoder.transform(&train_x)?;
        let y_train = target::forward_all(&train_rent);
        debug!(columns = encoder.n_features_out(), "encoded training matrix");

        let forest = RandomForestRegressor::new(config.forest.clone())
            .with_seed(config.seed)
            .fit(&x_train, &y_train)?;

        let x_test = encoder.transform(&test_x)?;
        let predicted = target::inverse_all(&forest.predict_batch(&x_test)?);
        let metrics = Metrics::calculate_all(&test_rent, &predicted)?;
        info!(
            mae = metrics.mae,
            rmse = metrics.rmse,
            r_squared = metrics.r_squared,
            "hold-out evaluation"
        );

        let mut importances: Vec<(String, f64)> = encoder
            .feature_names_out()
            .into_iter()
            .zip(forest.feature_importances().iter().copied())
            .collect();
        importances.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let metadata = ArtifactMetadata {
            format_version: FORMAT_VERSION,
            rows_total: filter_report.total,
            rows_kept: filter_report.kept,
            rows_train: split.train.len(),
            rows_test: split.test.len(),
            seed: config.seed,
            min_locality_support: config.min_locality_support,
            n_estimators: config.forest.n_estimators,
            max_depth: config.forest.max_depth,
            metrics,
            feature_importances: importances.clone(),
        };
        let model = TrainedModel::new(encoder, forest, metadata)?;

        let reference_prediction = model.predict_record(&reference_flat())?;
        info!(
            predicted_rent = reference_prediction.round(),
            "reference flat: 2 bed, 2 bath, 750 sqft, Semi-Furnished, Andheri"
        );

        importances.truncate(REPORT_TOP_N);
        let report = TrainingReport {
            filter: filter_report,
            rows_train: split.train.len(),
            rows_test: split.test.len(),
            metrics,
            top_features: importances,
            top_localities: vocabulary.top(REPORT_TOP_N),
            reference_prediction,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        info!(elapsed_secs = report.elapsed_secs, "training finished");
        Ok((model, report))
    }
}
