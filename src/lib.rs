//! # Dietwise
//!
//! Diet recommendation from biometric and lifestyle data using a
//! pre-trained tree-ensemble classifier.
//!
//! This crate provides:
//! - Deterministic encoding of form input into the model's feature row
//! - Loading and verification of the trained model artifact
//! - Mapping of the predicted class to a diet recommendation
//! - Terminal UI for local use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types and pure functions (RawInput, encoder, result mapper)
//! - `ports`: Trait definitions for external collaborators (the predictor)
//! - `adapters`: Concrete implementations (tree ensemble, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{FeatureRecord, RawInput, RecommendationReport, RecommendationResult};

/// Result type for Dietwise operations
pub type Result<T> = std::result::Result<T, DietError>;

/// Main error type for Dietwise
#[derive(Debug, thiserror::Error)]
pub enum DietError {
    #[error("Model unavailable: {0}")]
    PredictorUnavailable(String),

    #[error("Prediction failed: {0}")]
    PredictionMapping(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DietError {
    /// Extra guidance shown next to the error message, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PredictionMapping(_) => Some(
                "Check that the feature names and column order match exactly the ones used in training.",
            ),
            Self::PredictorUnavailable(_) => Some(
                "Place the model file at the configured path (DIETWISE_MODEL_PATH) and restart.",
            ),
            _ => None,
        }
    }
}
