//! Raw form input for a diet recommendation request.
//!
//! Categorical fields are closed enums whose labels match the options shown
//! on the form (and the category names the model was trained with).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a categorical label does not name a known option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} option: {value:?}")]
pub struct ParseChoiceError {
    pub field: &'static str,
    pub value: String,
}

/// Declares a categorical field: variants, their form labels, `Display`/`FromStr`
/// on those labels, and serde renames so JSON uses the same spelling.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $label)] $variant),+
        }

        impl $name {
            /// All options, in the order the form offers them.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Form labels, index-aligned with [`Self::ALL`].
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            #[must_use]
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = ParseChoiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok(Self::$variant),)+
                    other => Err(ParseChoiceError {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

choice_enum! {
    /// Biological sex as recorded by the training data.
    Gender, "gender" {
        Male => "Male",
        Female => "Female",
    }
}

choice_enum! {
    /// Habitual physical activity level.
    PhysicalActivity, "physical_activity" {
        Sedentary => "Sedentary",
        Moderate => "Moderate",
        Active => "Active",
    }
}

choice_enum! {
    /// Severity of the existing condition.
    Severity, "severity" {
        Mid => "Mid",
        Moderate => "Moderate",
        Severe => "Severe",
    }
}

choice_enum! {
    /// Existing medical condition.
    DiseaseStatus, "disease_status" {
        /// No diagnosed condition. Encodes to all disease flags cleared.
        Healthy => "None/Healthy",
        Hypertension => "Hypertension",
        Obesity => "Obesity",
        Unknown => "Unknown",
    }
}

choice_enum! {
    /// Preferred cuisine.
    Cuisine, "cuisine" {
        Indian => "Indian",
        Italian => "Italian",
        Mexican => "Mexican",
    }
}

choice_enum! {
    /// Declared food allergy.
    AllergyType, "allergy_type" {
        None => "None",
        Peanuts => "Peanuts",
        /// Has no dedicated slot in the feature schema.
        Gluten => "Gluten",
    }
}

choice_enum! {
    /// Dietary restriction already followed.
    DietaryRestriction, "dietary_restrictions" {
        None => "None",
        LowSugar => "Low_Sugar",
        LowSodium => "Low_Sodium",
    }
}

/// Closed numeric range accepted by the input surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRange {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

impl InputRange {
    const fn new(field: &'static str, min: f64, max: f64) -> Self {
        Self { field, min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && (self.min..=self.max).contains(&value)
    }

    /// Clamp a value into the range. NaN clamps to the minimum.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }

    #[must_use]
    pub fn clamp_u32(&self, value: u32) -> u32 {
        // Range bounds are whole numbers for every integer field.
        value.clamp(self.min as u32, self.max as u32)
    }
}

pub const AGE_RANGE: InputRange = InputRange::new("age", 10.0, 100.0);
pub const HEIGHT_RANGE: InputRange = InputRange::new("height_cm", 50.0, 250.0);
pub const WEIGHT_RANGE: InputRange = InputRange::new("weight_kg", 30.0, 300.0);
pub const GLUCOSE_RANGE: InputRange = InputRange::new("glucose", 50.0, 300.0);
pub const BLOOD_PRESSURE_RANGE: InputRange = InputRange::new("blood_pressure", 80.0, 200.0);
pub const CHOLESTEROL_RANGE: InputRange = InputRange::new("cholesterol", 100.0, 400.0);
pub const EXERCISE_RANGE: InputRange = InputRange::new("exercise_hours", 0.0, 20.0);
pub const ADHERENCE_RANGE: InputRange = InputRange::new("adherence_chance", 0.0, 100.0);
pub const IMBALANCE_RANGE: InputRange = InputRange::new("imbalance_score", 0.0, 1.0);
pub const CALORIES_RANGE: InputRange = InputRange::new("daily_calories", 1000.0, 5000.0);

/// Body mass index from weight in kilograms and height in centimetres.
///
/// The form's live BMI panel and the encoder both call this, so the value
/// shown to the user is the value the model sees.
#[must_use]
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Biometric and lifestyle values for one recommendation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    /// Years
    pub age: u32,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub physical_activity: PhysicalActivity,

    /// Fasting glucose, mg/dL
    pub glucose: u32,
    /// Systolic, mmHg
    pub blood_pressure: u32,
    /// mg/dL
    pub cholesterol: u32,
    pub severity: Severity,
    /// Weekly hours
    pub exercise_hours: f64,
    /// Percentage 0-100
    pub adherence_chance: u32,
    pub disease_status: DiseaseStatus,

    pub cuisine: Cuisine,
    pub allergy_type: AllergyType,
    pub dietary_restrictions: DietaryRestriction,
    /// Fraction in [0, 1]
    pub imbalance_score: f64,
    /// Current intake, kcal
    pub daily_calories: u32,
}

impl Default for RawInput {
    fn default() -> Self {
        Self {
            age: 25,
            gender: Gender::Male,
            height_cm: 170.0,
            weight_kg: 70.0,
            physical_activity: PhysicalActivity::Sedentary,
            glucose: 90,
            blood_pressure: 120,
            cholesterol: 180,
            severity: Severity::Mid,
            exercise_hours: 3.5,
            adherence_chance: 80,
            disease_status: DiseaseStatus::Healthy,
            cuisine: Cuisine::Indian,
            allergy_type: AllergyType::None,
            dietary_restrictions: DietaryRestriction::None,
            imbalance_score: 0.2,
            daily_calories: 2000,
        }
    }
}

impl RawInput {
    /// Derived body mass index.
    #[must_use]
    pub fn bmi(&self) -> f64 {
        compute_bmi(self.weight_kg, self.height_cm)
    }

    /// Clamp every numeric field into its accepted range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            age: AGE_RANGE.clamp_u32(self.age),
            height_cm: HEIGHT_RANGE.clamp(self.height_cm),
            weight_kg: WEIGHT_RANGE.clamp(self.weight_kg),
            glucose: GLUCOSE_RANGE.clamp_u32(self.glucose),
            blood_pressure: BLOOD_PRESSURE_RANGE.clamp_u32(self.blood_pressure),
            cholesterol: CHOLESTEROL_RANGE.clamp_u32(self.cholesterol),
            exercise_hours: EXERCISE_RANGE.clamp(self.exercise_hours),
            adherence_chance: ADHERENCE_RANGE.clamp_u32(self.adherence_chance),
            imbalance_score: IMBALANCE_RANGE.clamp(self.imbalance_score),
            daily_calories: CALORIES_RANGE.clamp_u32(self.daily_calories),
            ..self
        }
    }

    /// Validate that all numeric fields are within their accepted ranges.
    ///
    /// # Errors
    /// Returns one message per offending field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let checks = [
            (AGE_RANGE, f64::from(self.age)),
            (HEIGHT_RANGE, self.height_cm),
            (WEIGHT_RANGE, self.weight_kg),
            (GLUCOSE_RANGE, f64::from(self.glucose)),
            (BLOOD_PRESSURE_RANGE, f64::from(self.blood_pressure)),
            (CHOLESTEROL_RANGE, f64::from(self.cholesterol)),
            (EXERCISE_RANGE, self.exercise_hours),
            (ADHERENCE_RANGE, f64::from(self.adherence_chance)),
            (IMBALANCE_RANGE, self.imbalance_score),
            (CALORIES_RANGE, f64::from(self.daily_calories)),
        ];

        let errors: Vec<String> = checks
            .iter()
            .filter(|(range, value)| !range.contains(*value))
            .map(|(range, value)| {
                format!(
                    "{} {} out of range [{}, {}]",
                    range.field, value, range.min, range.max
                )
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
