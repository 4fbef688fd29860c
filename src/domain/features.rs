//! Feature encoding for the diet classifier.
//!
//! The model was trained on a one-hot/label-encoded frame with a fixed column
//! order. [`encode`] reproduces that frame row for a single [`RawInput`].

use serde::{Deserialize, Serialize};

use super::input::{
    AllergyType, Cuisine, DietaryRestriction, DiseaseStatus, Gender, PhysicalActivity, RawInput,
    Severity,
};

/// Column names expected by the model, in training order.
pub const FEATURE_NAMES: [&str; 23] = [
    "severity",
    "physical_activity_level",
    "dietary_restrictions",
    "gender_Male",
    "allergies_No_Allergies",
    "allergies_Peanuts",
    "preferred_cuisine_Indian",
    "preferred_cuisine_Italian",
    "preferred_cuisine_Mexican",
    "disease_Hypertension",
    "disease_Obesity",
    "disease_Unknown",
    "age",
    "weight",
    "height",
    "bmi",
    "daily_caloric_intake",
    "cholesterol",
    "blood_pressure",
    "glucose",
    "exercise_hours",
    "adherence_to_diet_plan",
    "dietary_nutrient_imbalance_score",
];

/// Number of model input columns.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// One encoded model input row.
///
/// Field declaration order matches [`FEATURE_NAMES`], so the serialized JSON
/// object lists keys in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub severity: f64,
    pub physical_activity_level: f64,
    pub dietary_restrictions: f64,
    #[serde(rename = "gender_Male")]
    pub gender_male: f64,
    #[serde(rename = "allergies_No_Allergies")]
    pub allergies_no_allergies: f64,
    #[serde(rename = "allergies_Peanuts")]
    pub allergies_peanuts: f64,
    #[serde(rename = "preferred_cuisine_Indian")]
    pub preferred_cuisine_indian: f64,
    #[serde(rename = "preferred_cuisine_Italian")]
    pub preferred_cuisine_italian: f64,
    #[serde(rename = "preferred_cuisine_Mexican")]
    pub preferred_cuisine_mexican: f64,
    #[serde(rename = "disease_Hypertension")]
    pub disease_hypertension: f64,
    #[serde(rename = "disease_Obesity")]
    pub disease_obesity: f64,
    #[serde(rename = "disease_Unknown")]
    pub disease_unknown: f64,
    pub age: f64,
    pub weight: f64,
    pub height: f64,
    pub bmi: f64,
    pub daily_caloric_intake: f64,
    pub cholesterol: f64,
    pub blood_pressure: f64,
    pub glucose: f64,
    pub exercise_hours: f64,
    pub adherence_to_diet_plan: f64,
    pub dietary_nutrient_imbalance_score: f64,
}

impl FeatureRecord {
    /// Values in [`FEATURE_NAMES`] order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.severity,
            self.physical_activity_level,
            self.dietary_restrictions,
            self.gender_male,
            self.allergies_no_allergies,
            self.allergies_peanuts,
            self.preferred_cuisine_indian,
            self.preferred_cuisine_italian,
            self.preferred_cuisine_mexican,
            self.disease_hypertension,
            self.disease_obesity,
            self.disease_unknown,
            self.age,
            self.weight,
            self.height,
            self.bmi,
            self.daily_caloric_intake,
            self.cholesterol,
            self.blood_pressure,
            self.glucose,
            self.exercise_hours,
            self.adherence_to_diet_plan,
            self.dietary_nutrient_imbalance_score,
        ]
    }

    /// `(column name, value)` pairs for diagnostic display.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES.iter().copied().zip(self.to_vec()).collect()
    }
}

fn flag(set: bool) -> f64 {
    if set {
        1.0
    } else {
        0.0
    }
}

fn severity_code(severity: Severity) -> f64 {
    match severity {
        Severity::Mid => 0.0,
        Severity::Moderate => 1.0,
        Severity::Severe => 2.0,
    }
}

fn activity_code(activity: PhysicalActivity) -> f64 {
    match activity {
        PhysicalActivity::Active => 0.0,
        PhysicalActivity::Moderate => 1.0,
        PhysicalActivity::Sedentary => 2.0,
    }
}

fn restriction_code(restriction: DietaryRestriction) -> f64 {
    match restriction {
        DietaryRestriction::LowSodium => 0.0,
        DietaryRestriction::LowSugar => 1.0,
        DietaryRestriction::None => 2.0,
    }
}

/// Encode raw form values into the model's input row.
///
/// Two quirks of the training frame are kept as-is: `None/Healthy` clears all
/// three disease flags (no `disease_None` column exists), and a gluten allergy
/// clears both allergy flags (no `allergies_Gluten` column exists).
#[must_use]
pub fn encode(input: &RawInput) -> FeatureRecord {
    FeatureRecord {
        severity: severity_code(input.severity),
        physical_activity_level: activity_code(input.physical_activity),
        dietary_restrictions: restriction_code(input.dietary_restrictions),
        gender_male: flag(input.gender == Gender::Male),
        allergies_no_allergies: flag(input.allergy_type == AllergyType::None),
        allergies_peanuts: flag(input.allergy_type == AllergyType::Peanuts),
        preferred_cuisine_indian: flag(input.cuisine == Cuisine::Indian),
        preferred_cuisine_italian: flag(input.cuisine == Cuisine::Italian),
        preferred_cuisine_mexican: flag(input.cuisine == Cuisine::Mexican),
        disease_hypertension: flag(input.disease_status == DiseaseStatus::Hypertension),
        disease_obesity: flag(input.disease_status == DiseaseStatus::Obesity),
        disease_unknown: flag(input.disease_status == DiseaseStatus::Unknown),
        age: f64::from(input.age),
        weight: input.weight_kg,
        height: input.height_cm,
        bmi: input.bmi(),
        daily_caloric_intake: f64::from(input.daily_calories),
        cholesterol: f64::from(input.cholesterol),
        blood_pressure: f64::from(input.blood_pressure),
        glucose: f64::from(input.glucose),
        exercise_hours: input.exercise_hours,
        adherence_to_diet_plan: f64::from(input.adherence_chance),
        dietary_nutrient_imbalance_score: input.imbalance_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(record: &FeatureRecord, name: &str) -> f64 {
        record
            .entries()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .expect("feature present")
    }

    #[test]
    fn test_record_has_schema_keys_in_order() {
        let record = encode(&RawInput::default());
        let json = serde_json::to_value(record).expect("serialize");
        let keys: Vec<&str> = json
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();

        // serde_json::Map is a BTreeMap without `preserve_order`, so compare as sets
        // here and check ordering through `entries()` below.
        let mut expected: Vec<&str> = FEATURE_NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);

        let names: Vec<&str> = record.entries().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, FEATURE_NAMES);
        assert_eq!(record.to_vec().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_serialized_text_follows_schema_order() {
        let record = encode(&RawInput::default());
        let text = serde_json::to_string(&record).expect("serialize");
        let positions: Vec<usize> = FEATURE_NAMES
            .iter()
            .map(|name| text.find(&format!("\"{name}\":")).expect("key present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_binary_fields_are_zero_or_one() {
        let inputs = [
            RawInput::default(),
            RawInput {
                gender: Gender::Female,
                cuisine: Cuisine::Mexican,
                allergy_type: AllergyType::Gluten,
                disease_status: DiseaseStatus::Obesity,
                ..RawInput::default()
            },
        ];
        for input in &inputs {
            let record = encode(input);
            for (name, v) in record.entries().into_iter().skip(3).take(9) {
                assert!(v == 0.0 || v == 1.0, "{name} = {v}");
            }
        }
    }

    #[test]
    fn test_passthrough_fields_copy_inputs() {
        let input = RawInput {
            age: 61,
            height_cm: 158.4,
            weight_kg: 81.2,
            glucose: 140,
            blood_pressure: 150,
            cholesterol: 240,
            exercise_hours: 1.5,
            adherence_chance: 35,
            imbalance_score: 0.75,
            daily_calories: 2800,
            ..RawInput::default()
        };
        let record = encode(&input);

        assert!((record.age - 61.0).abs() < f64::EPSILON);
        assert!((record.height - 158.4).abs() < f64::EPSILON);
        assert!((record.weight - 81.2).abs() < f64::EPSILON);
        assert!((record.glucose - 140.0).abs() < f64::EPSILON);
        assert!((record.blood_pressure - 150.0).abs() < f64::EPSILON);
        assert!((record.cholesterol - 240.0).abs() < f64::EPSILON);
        assert!((record.exercise_hours - 1.5).abs() < f64::EPSILON);
        assert!((record.adherence_to_diet_plan - 35.0).abs() < f64::EPSILON);
        assert!((record.dietary_nutrient_imbalance_score - 0.75).abs() < f64::EPSILON);
        assert!((record.daily_caloric_intake - 2800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bmi_matches_displayed_value_exactly() {
        for (height, weight) in [(170.0, 70.0), (152.3, 48.9), (201.0, 133.7)] {
            let input = RawInput {
                height_cm: height,
                weight_kg: weight,
                ..RawInput::default()
            };
            let record = encode(&input);
            assert_eq!(record.bmi.to_bits(), input.bmi().to_bits());
        }
        let record = encode(&RawInput::default());
        assert!((record.bmi - 24.22).abs() < 0.005);
    }

    #[test]
    fn test_label_encodings() {
        let input = RawInput {
            severity: Severity::Severe,
            physical_activity: PhysicalActivity::Active,
            dietary_restrictions: DietaryRestriction::LowSugar,
            ..RawInput::default()
        };
        let record = encode(&input);
        assert!((record.severity - 2.0).abs() < f64::EPSILON);
        assert!(record.physical_activity_level.abs() < f64::EPSILON);
        assert!((record.dietary_restrictions - 1.0).abs() < f64::EPSILON);

        let defaults = encode(&RawInput::default());
        assert!(defaults.severity.abs() < f64::EPSILON);
        assert!((defaults.physical_activity_level - 2.0).abs() < f64::EPSILON);
        assert!((defaults.dietary_restrictions - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_gender_flag() {
        let male = encode(&RawInput::default());
        let female = encode(&RawInput {
            gender: Gender::Female,
            ..RawInput::default()
        });
        assert!((value(&male, "gender_Male") - 1.0).abs() < f64::EPSILON);
        assert!(value(&female, "gender_Male").abs() < f64::EPSILON);
    }

    #[test]
    fn test_cuisine_one_hot() {
        let record = encode(&RawInput {
            cuisine: Cuisine::Italian,
            ..RawInput::default()
        });
        assert!(record.preferred_cuisine_indian.abs() < f64::EPSILON);
        assert!((record.preferred_cuisine_italian - 1.0).abs() < f64::EPSILON);
        assert!(record.preferred_cuisine_mexican.abs() < f64::EPSILON);
    }

    #[test]
    fn test_disease_flags() {
        let unknown = encode(&RawInput {
            disease_status: DiseaseStatus::Unknown,
            ..RawInput::default()
        });
        assert!((unknown.disease_unknown - 1.0).abs() < f64::EPSILON);
        assert!(unknown.disease_hypertension.abs() < f64::EPSILON);
        assert!(unknown.disease_obesity.abs() < f64::EPSILON);

        // Healthy has no column of its own: every disease flag stays clear.
        let healthy = encode(&RawInput::default());
        assert!(healthy.disease_unknown.abs() < f64::EPSILON);
        assert!(healthy.disease_hypertension.abs() < f64::EPSILON);
        assert!(healthy.disease_obesity.abs() < f64::EPSILON);
    }

    #[test]
    fn test_gluten_clears_both_allergy_flags() {
        let record = encode(&RawInput {
            allergy_type: AllergyType::Gluten,
            ..RawInput::default()
        });
        assert!(record.allergies_no_allergies.abs() < f64::EPSILON);
        assert!(record.allergies_peanuts.abs() < f64::EPSILON);

        let peanuts = encode(&RawInput {
            allergy_type: AllergyType::Peanuts,
            ..RawInput::default()
        });
        assert!(peanuts.allergies_no_allergies.abs() < f64::EPSILON);
        assert!((peanuts.allergies_peanuts - 1.0).abs() < f64::EPSILON);
    }
}
