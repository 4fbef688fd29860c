//! Predictor port: Trait for the pre-trained diet classifier.
//!
//! This trait abstracts the trained model artifact from the application logic,
//! so the encode/predict/map pipeline can run against any classifier,
//! including substitutes in tests.

use std::path::PathBuf;

use crate::domain::FeatureRecord;

/// Errors raised while loading or querying a predictor.
#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    #[error("model file not found at {0:?}")]
    ModelNotFound(PathBuf),

    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed model artifact: {0}")]
    Malformed(String),

    #[error("model signature check failed: {0}")]
    Signature(String),

    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// Trait for classifiers that turn one feature row into a class index.
///
/// Implementations must be deterministic for identical input and must not
/// mutate shared state once loaded.
pub trait DietPredictor: Send + Sync {
    /// Column names the model was trained on, in training order.
    fn feature_names(&self) -> &[String];

    /// Predict the class index for a single feature row.
    ///
    /// The index is returned unchecked; mapping it to a diet category is the
    /// caller's job.
    ///
    /// # Errors
    /// Returns `PredictorError::Prediction` if the model cannot score the row.
    fn predict(&self, features: &FeatureRecord) -> Result<i64, PredictorError>;
}
