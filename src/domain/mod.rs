//! Domain layer: Core types and pure functions.
//!
//! Nothing here touches the filesystem, the model artifact or the terminal.
//! Encoding and result mapping are total, deterministic functions.

mod features;
mod input;
mod recommendation;

pub use features::{encode, FeatureRecord, FEATURE_COUNT, FEATURE_NAMES};
pub use input::{
    compute_bmi, AllergyType, Cuisine, DietaryRestriction, DiseaseStatus, Gender, InputRange,
    ParseChoiceError, PhysicalActivity, RawInput, Severity, ADHERENCE_RANGE, AGE_RANGE,
    BLOOD_PRESSURE_RANGE, CALORIES_RANGE, CHOLESTEROL_RANGE, EXERCISE_RANGE, GLUCOSE_RANGE,
    HEIGHT_RANGE, IMBALANCE_RANGE, WEIGHT_RANGE,
};
pub use recommendation::{
    map_class_index, DietClass, MappingError, RecommendationReport, RecommendationResult,
};
