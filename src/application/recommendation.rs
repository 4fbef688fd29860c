//! Recommendation service: Orchestrates the encode → predict → map pipeline.
//!
//! The predictor is loaded once at startup. If loading fails, or the loaded
//! model was trained on a different feature schema, the service stays
//! unavailable for the rest of the process and rejects every request.

use std::sync::Arc;

use crate::adapters::forest::ForestPredictor;
use crate::config::ModelConfig;
use crate::domain::{encode, map_class_index, RawInput, RecommendationReport, FEATURE_NAMES};
use crate::ports::{DietPredictor, PredictorError};
use crate::DietError;

/// Whether recommendations can be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    Ready,
    Unavailable { reason: String },
}

/// Service for generating diet recommendations.
pub struct RecommendationService<P>
where
    P: DietPredictor,
{
    predictor: Option<Arc<P>>,
    status: ModelStatus,
}

/// Compare a model's training schema against the encoder's column order.
fn check_schema(names: &[String]) -> Result<(), PredictorError> {
    if names.len() != FEATURE_NAMES.len() {
        return Err(PredictorError::SchemaMismatch(format!(
            "model expects {} features, encoder produces {}",
            names.len(),
            FEATURE_NAMES.len()
        )));
    }
    if let Some((i, (got, want))) = names
        .iter()
        .zip(FEATURE_NAMES.iter())
        .enumerate()
        .find(|(_, (got, want))| got.as_str() != **want)
    {
        return Err(PredictorError::SchemaMismatch(format!(
            "column {i} is {got:?} in the model but {want:?} in the encoder"
        )));
    }
    Ok(())
}

impl<P> RecommendationService<P>
where
    P: DietPredictor,
{
    /// Create a service around a loaded predictor.
    ///
    /// The predictor's feature schema is validated here; a mismatch leaves
    /// the service unavailable rather than producing silently wrong results.
    pub fn new(predictor: Arc<P>) -> Self {
        match check_schema(predictor.feature_names()) {
            Ok(()) => {
                tracing::info!("Recommendation service ready");
                Self {
                    predictor: Some(predictor),
                    status: ModelStatus::Ready,
                }
            }
            Err(e) => {
                tracing::error!("Rejecting model: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Create a service from the outcome of a one-time predictor load.
    pub fn from_load(result: Result<P, PredictorError>) -> Self {
        match result {
            Ok(predictor) => Self::new(Arc::new(predictor)),
            Err(e) => {
                tracing::error!("Model could not be loaded: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Create a service that rejects every request.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            predictor: None,
            status: ModelStatus::Unavailable {
                reason: reason.into(),
            },
        }
    }

    #[must_use]
    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status == ModelStatus::Ready
    }

    /// Generate a recommendation for one form submission.
    ///
    /// # Errors
    /// - `PredictorUnavailable` if no usable model was loaded
    /// - `Validation` if the input violates its accepted ranges
    /// - `PredictionMapping` if the model fails or returns an unknown class
    pub fn generate(&self, input: &RawInput) -> Result<RecommendationReport, DietError> {
        let predictor = match (&self.predictor, &self.status) {
            (Some(p), ModelStatus::Ready) => p,
            (_, ModelStatus::Unavailable { reason }) => {
                return Err(DietError::PredictorUnavailable(reason.clone()))
            }
            (None, ModelStatus::Ready) => {
                return Err(DietError::PredictorUnavailable("no model loaded".into()))
            }
        };

        input
            .validate()
            .map_err(|errors| DietError::Validation(errors.join(", ")))?;

        tracing::debug!("Step 1: Encoding input...");
        let features = encode(input);

        tracing::debug!("Step 2: Running classifier...");
        let class_index = predictor.predict(&features).map_err(|e| {
            tracing::warn!("Predictor failed: {}", e);
            DietError::PredictionMapping(e.to_string())
        })?;

        tracing::debug!("Step 3: Mapping class index {}...", class_index);
        let result = map_class_index(class_index).map_err(|e| {
            tracing::warn!("{}", e);
            DietError::PredictionMapping(e.to_string())
        })?;

        tracing::info!("Recommendation generated: {}", result.class_label);

        Ok(RecommendationReport {
            features,
            class_index,
            result,
        })
    }
}

impl RecommendationService<ForestPredictor> {
    /// Load the configured model artifact once and wrap it in a service.
    #[must_use]
    pub fn load(config: &ModelConfig) -> Self {
        tracing::info!("Loading model from {:?}", config.path);
        Self::from_load(ForestPredictor::load(&config.path, &config.signature))
    }
}
