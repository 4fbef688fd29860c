//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the recommendation pipeline and the trained model.

mod predictor;

pub use predictor::{DietPredictor, PredictorError};
