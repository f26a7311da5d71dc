//! Error types for training, persistence and prediction.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PredictorError>;

/// Error type for every fallible operation outside request validation.
#[derive(Debug, Error)]
pub enum PredictorError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Binary (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),
    /// Invalid hyperparameter or configuration value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Feature dimension mismatch.
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
    /// Too few rows survived cleaning to train a reliable model.
    #[error("Insufficient data: {got} rows after cleaning, at least {required} required")]
    InsufficientData { required: usize, got: usize },
    /// Artifact header or version not recognised.
    #[error("Artifact format error: {0}")]
    ArtifactFormat(String),
}

impl From<bincode::Error> for PredictorError {
    fn from(err: bincode::Error) -> Self {
        PredictorError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_insufficient_data() {
        let err = PredictorError::InsufficientData {
            required: 500,
            got: 120,
        };
        let msg = err.to_string();
        assert!(msg.contains("120"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn test_error_display_feature_mismatch() {
        let err = PredictorError::FeatureMismatch {
            expected_features: 6,
            got_features: 3,
        };
        assert!(err.to_string().contains("Feature mismatch"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: PredictorError = io_err.into();
        assert!(matches!(err, PredictorError::Io(_)));
    }

    #[test]
    fn test_error_from_bincode_error() {
        let bad_bytes: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let result: std::result::Result<String, bincode::Error> = bincode::deserialize(bad_bytes);
        if let Err(e) = result {
            let err: PredictorError = e.into();
            assert!(matches!(err, PredictorError::Serialization(_)));
        }
    }

    #[test]
    fn test_error_is_std_error() {
        let err = PredictorError::InvalidParameter("test".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
