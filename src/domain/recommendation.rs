//! Recommendation result types.
//!
//! Maps the classifier's output class index to a diet label and advice.

use serde::{Deserialize, Serialize};

use super::features::FeatureRecord;

/// Diet category predicted by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DietClass {
    /// Class 0
    #[serde(rename = "Balanced")]
    Balanced,
    /// Class 1
    #[serde(rename = "Low_Sodium")]
    LowSodium,
    /// Class 2
    #[serde(rename = "Low_Carb")]
    LowCarb,
}

/// The model returned an index with no diet category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("model returned class index {index}, expected one of 0, 1, 2")]
pub struct MappingError {
    pub index: i64,
}

impl DietClass {
    /// Categories in class-index order.
    pub const ALL: [Self; 3] = [Self::Balanced, Self::LowSodium, Self::LowCarb];

    /// Look up the category for a class index.
    ///
    /// # Errors
    /// Returns `MappingError` for any index outside `0..=2`.
    pub fn from_index(index: i64) -> Result<Self, MappingError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(MappingError { index })
    }

    #[must_use]
    pub fn index(&self) -> i64 {
        match self {
            Self::Balanced => 0,
            Self::LowSodium => 1,
            Self::LowCarb => 2,
        }
    }

    /// Label as used by the training targets.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::LowSodium => "Low_Sodium",
            Self::LowCarb => "Low_Carb",
        }
    }

    /// Short advice shown with the recommendation.
    #[must_use]
    pub fn advisory(&self) -> &'static str {
        match self {
            Self::Balanced => {
                "A balanced diet includes a variety of foods from all food groups: proteins, healthy fats, and carbohydrates."
            }
            Self::LowSodium => {
                "Focus on fresh foods (fruits, vegetables) and avoid processed items, canned soups, and salty snacks."
            }
            Self::LowCarb => {
                "Prioritize proteins (meat, fish, eggs) and healthy fats. Limit sugar, bread, pasta, and rice."
            }
        }
    }

    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Balanced => (16, 185, 129),  // Emerald (#10B981)
            Self::LowSodium => (59, 130, 246), // Blue (#3B82F6)
            Self::LowCarb => (251, 191, 36),   // Amber (#FBBF24)
        }
    }
}

impl std::fmt::Display for DietClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Human-readable outcome of one recommendation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub class_label: DietClass,
    pub advisory_text: String,
}

impl RecommendationResult {
    #[must_use]
    pub fn new(class_label: DietClass) -> Self {
        Self {
            class_label,
            advisory_text: class_label.advisory().to_string(),
        }
    }
}

/// Map a predicted class index to its recommendation.
///
/// # Errors
/// Returns `MappingError` for any index outside `0..=2`.
pub fn map_class_index(index: i64) -> Result<RecommendationResult, MappingError> {
    DietClass::from_index(index).map(RecommendationResult::new)
}

/// Everything produced for one request: the result plus the exact model
/// input and raw output behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub features: FeatureRecord,
    pub class_index: i64,
    pub result: RecommendationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_known_indices() {
        assert_eq!(map_class_index(0).unwrap().class_label.label(), "Balanced");
        assert_eq!(map_class_index(1).unwrap().class_label.label(), "Low_Sodium");
        assert_eq!(map_class_index(2).unwrap().class_label.label(), "Low_Carb");
    }

    #[test]
    fn test_map_unknown_index_is_error() {
        assert_eq!(map_class_index(5), Err(MappingError { index: 5 }));
        assert_eq!(map_class_index(-1), Err(MappingError { index: -1 }));
        assert!(map_class_index(i64::MAX).is_err());
    }

    #[test]
    fn test_advisory_text_matches_class() {
        let result = map_class_index(1).unwrap();
        assert!(result.advisory_text.contains("fresh foods"));
        let result = map_class_index(2).unwrap();
        assert!(result.advisory_text.contains("Limit sugar, bread, pasta, and rice"));
        let result = map_class_index(0).unwrap();
        assert!(result.advisory_text.contains("proteins, healthy fats, and carbohydrates"));
    }

    #[test]
    fn test_index_round_trip() {
        for class in DietClass::ALL {
            assert_eq!(DietClass::from_index(class.index()), Ok(class));
        }
    }

    #[test]
    fn test_result_serializes_with_training_labels() {
        let json = serde_json::to_string(&map_class_index(2).unwrap()).expect("serialize");
        assert!(json.contains("\"class_label\":\"Low_Carb\""));
    }
}
