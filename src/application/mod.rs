//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the recommendation use case.

mod recommendation;

pub use recommendation::{ModelStatus, RecommendationService};
