//! The persisted model bundle: fitted encoder, fitted forest, feature order
//! and training metadata in one versioned file.
//!
//! File layout: 8-byte magic, little-endian `u32` format version, then the
//! bincode-encoded [`ArtifactParams`]. Saving writes to a temporary file in
//! the target directory and renames it into place.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{PredictorError, Result};
use crate::features::CanonicalFeatureRecord;
use crate::metrics::RegressionMetrics;
use crate::model::{FittedRandomForest, ForestParams, InferenceModel};
use crate::preprocessing::{FeatureEncoderParams, FittedFeatureEncoder, FittedTransformer};
use crate::target;

const MAGIC: &[u8; 8] = b"RENTMDL\0";

/// Bumped whenever [`ArtifactParams`] changes shape.
pub const FORMAT_VERSION: u32 = 1;

/// Training provenance stored with the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub format_version: u32,
    pub rows_total: usize,
    pub rows_kept: usize,
    pub rows_train: usize,
    pub rows_test: usize,
    pub seed: u64,
    pub min_locality_support: usize,
    pub n_estimators: usize,
    pub max_depth: usize,
    /// Hold-out metrics in rupees; `metrics.mae` is the confidence half-width.
    pub metrics: RegressionMetrics,
    /// `(output feature name, importance)`, most important first.
    pub feature_importances: Vec<(String, f64)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtifactParams {
    pub metadata: ArtifactMetadata,
    pub feature_order: Vec<String>,
    pub encoder: FeatureEncoderParams,
    pub forest: ForestParams,
}

/// A fitted encoder + forest pair, immutable once built.
#[derive(Clone, Debug)]
pub struct TrainedModel {
    metadata: ArtifactMetadata,
    feature_order: Vec<String>,
    encoder: FittedFeatureEncoder,
    forest: FittedRandomForest,
}

impl TrainedModel {
    pub fn new(
        encoder: FittedFeatureEncoder,
        forest: FittedRandomForest,
        metadata: ArtifactMetadata,
    ) -> Result<Self> {
        if encoder.n_features_out() != forest.n_features() {
            return Err(PredictorError::FeatureMismatch {
                expected_features: forest.n_features(),
                got_features: encoder.n_features_out(),
            });
        }
        Ok(Self {
            feature_order: encoder.feature_order(),
            metadata,
            encoder,
            forest,
        })
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    /// Hold-out mean absolute error in rupees.
    pub fn mae(&self) -> f64 {
        self.metadata.metrics.mae
    }

    /// Input columns in the order the model was trained with.
    pub fn feature_order(&self) -> &[String] {
        &self.feature_order
    }

    /// Categories the encoder learned for a categorical column.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.encoder.categories_for(column)
    }

    /// Predicted monthly rent (unrounded) for one record.
    pub fn predict_record(&self, record: &CanonicalFeatureRecord) -> Result<f64> {
        let x = self.encoder.encode_one(record)?;
        Ok(target::inverse(self.forest.predict(&x)?))
    }

    /// Predicted monthly rents for a batch of records.
    pub fn predict_records(&self, records: &[CanonicalFeatureRecord]) -> Result<Vec<f64>> {
        let x = self.encoder.transform(records)?;
        Ok(target::inverse_all(&self.forest.predict_batch(&x)?))
    }

    pub fn to_params(&self) -> ArtifactParams {
        ArtifactParams {
            metadata: self.metadata.clone(),
            feature_order: self.feature_order.clone(),
            encoder: self.encoder.extract_params(),
            forest: self.forest.extract_params(),
        }
    }

    pub fn from_params(params: ArtifactParams) -> Result<Self> {
        let encoder = FittedFeatureEncoder::from_params(params.encoder)?;
        let forest = FittedRandomForest::from_params(params.forest)?;
        let model = Self::new(encoder, forest, params.metadata)?;
        if model.feature_order != params.feature_order {
            return Err(PredictorError::ArtifactFormat(
                "stored feature order does not match the encoder".to_string(),
            ));
        }
        Ok(model)
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        bincode::serialize_into(&mut writer, &self.to_params())?;
        writer.flush()?;
        Ok(())
    }

    fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 8];
        reader
            .read_exact(&mut magic)
            .map_err(|_| PredictorError::ArtifactFormat("file too short".to_string()))?;
        if &magic != MAGIC {
            return Err(PredictorError::ArtifactFormat(
                "not a rent model artifact".to_string(),
            ));
        }
        let mut version = [0u8; 4];
        reader
            .read_exact(&mut version)
            .map_err(|_| PredictorError::ArtifactFormat("missing format version".to_string()))?;
        let version = u32::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(PredictorError::ArtifactFormat(format!(
                "unsupported format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }
        let params: ArtifactParams = bincode::deserialize_from(reader)?;
        Self::from_params(params)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read_from(bytes)
    }

    /// Write the artifact atomically, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let temp_file = NamedTempFile::new_in(parent)?;
        self.write_to(BufWriter::new(temp_file.as_file()))?;
        temp_file.persist(path).map_err(|e| e.error)?;
        info!(path = %path.display(), "saved model artifact");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let model = Self::read_from(BufReader::new(File::open(path)?))?;
        info!(
            path = %path.display(),
            trees = model.forest.n_trees(),
            mae = model.mae(),
            "loaded model artifact"
        );
        Ok(model)
    }
}
