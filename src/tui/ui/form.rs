//! Biometric and lifestyle input form.

use std::path::Path;
use std::str::FromStr;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use zeroize::Zeroize;

use crate::application::ModelStatus;
use crate::domain::{
    compute_bmi, AllergyType, Cuisine, DietaryRestriction, DiseaseStatus, Gender, InputRange,
    ParseChoiceError, PhysicalActivity, RawInput, Severity, ADHERENCE_RANGE, AGE_RANGE,
    BLOOD_PRESSURE_RANGE, CALORIES_RANGE, CHOLESTEROL_RANGE, EXERCISE_RANGE, GLUCOSE_RANGE,
    HEIGHT_RANGE, IMBALANCE_RANGE, WEIGHT_RANGE,
};
use crate::tui::styles::DietTheme;

const MAX_NUMBER_LEN: usize = 8;

// Row order on the form.
const AGE: usize = 0;
const GENDER: usize = 1;
const HEIGHT: usize = 2;
const WEIGHT: usize = 3;
const ACTIVITY: usize = 4;
const GLUCOSE: usize = 5;
const BLOOD_PRESSURE: usize = 6;
const CHOLESTEROL: usize = 7;
const SEVERITY: usize = 8;
const EXERCISE: usize = 9;
const ADHERENCE: usize = 10;
const DISEASE: usize = 11;
const CUISINE: usize = 12;
const ALLERGY: usize = 13;
const RESTRICTION: usize = 14;
const IMBALANCE: usize = 15;
const CALORIES: usize = 16;

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Free numeric entry, clamped into `range` on submit.
    Number { range: InputRange, integer: bool },
    /// One of a fixed set of labels, cycled with ←/→.
    Choice { options: &'static [&'static str] },
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub kind: FieldKind,
    pub value: String,
}

impl FormField {
    fn number(label: &'static str, hint: &'static str, range: InputRange, value: f64) -> Self {
        Self {
            label,
            hint,
            kind: FieldKind::Number {
                range,
                integer: false,
            },
            value: format!("{value}"),
        }
    }

    fn integer(label: &'static str, hint: &'static str, range: InputRange, value: u32) -> Self {
        Self {
            label,
            hint,
            kind: FieldKind::Number {
                range,
                integer: true,
            },
            value: value.to_string(),
        }
    }

    fn choice(
        label: &'static str,
        hint: &'static str,
        options: &'static [&'static str],
        value: &'static str,
    ) -> Self {
        Self {
            label,
            hint,
            kind: FieldKind::Choice { options },
            value: value.to_string(),
        }
    }

    fn is_choice(&self) -> bool {
        matches!(self.kind, FieldKind::Choice { .. })
    }
}

fn fields_for(input: &RawInput) -> Vec<FormField> {
    vec![
        FormField::integer("Age", "years (10-100)", AGE_RANGE, input.age),
        FormField::choice("Gender", "", Gender::LABELS, input.gender.label()),
        FormField::number("Height", "cm (50-250)", HEIGHT_RANGE, input.height_cm),
        FormField::number("Weight", "kg (30-300)", WEIGHT_RANGE, input.weight_kg),
        FormField::choice(
            "Physical Activity",
            "",
            PhysicalActivity::LABELS,
            input.physical_activity.label(),
        ),
        FormField::integer("Glucose", "mg/dL (50-300)", GLUCOSE_RANGE, input.glucose),
        FormField::integer(
            "Blood Pressure",
            "mmHg systolic (80-200)",
            BLOOD_PRESSURE_RANGE,
            input.blood_pressure,
        ),
        FormField::integer(
            "Cholesterol",
            "mg/dL (100-400)",
            CHOLESTEROL_RANGE,
            input.cholesterol,
        ),
        FormField::choice("Severity", "", Severity::LABELS, input.severity.label()),
        FormField::number(
            "Exercise",
            "hours/week (0-20)",
            EXERCISE_RANGE,
            input.exercise_hours,
        ),
        FormField::integer(
            "Adherence Chance",
            "% (0-100)",
            ADHERENCE_RANGE,
            input.adherence_chance,
        ),
        FormField::choice(
            "Disease",
            "",
            DiseaseStatus::LABELS,
            input.disease_status.label(),
        ),
        FormField::choice("Cuisine", "", Cuisine::LABELS, input.cuisine.label()),
        FormField::choice("Allergies", "", AllergyType::LABELS, input.allergy_type.label()),
        FormField::choice(
            "Restrictions",
            "",
            DietaryRestriction::LABELS,
            input.dietary_restrictions.label(),
        ),
        FormField::number(
            "Nutrient Imbalance",
            "score (0-1)",
            IMBALANCE_RANGE,
            input.imbalance_score,
        ),
        FormField::integer(
            "Daily Calories",
            "kcal (1000-5000)",
            CALORIES_RANGE,
            input.daily_calories,
        ),
    ]
}

/// Form state
pub struct FormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::from_input(&RawInput::default())
    }
}

impl FormState {
    #[must_use]
    pub fn from_input(input: &RawInput) -> Self {
        Self {
            fields: fields_for(input),
            selected_field: 0,
            error_message: None,
        }
    }

    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current numeric field.
    pub fn input_char(&mut self, c: char) {
        let field = &mut self.fields[self.selected_field];
        let FieldKind::Number { integer, .. } = field.kind else {
            return;
        };
        if field.value.len() >= MAX_NUMBER_LEN {
            return;
        }
        let accepted = c.is_ascii_digit() || (c == '.' && !integer && !field.value.contains('.'));
        if accepted {
            field.value.push(c);
            self.error_message = None;
        }
    }

    pub fn delete_char(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !field.is_choice() {
            field.value.pop();
        }
    }

    pub fn clear_field(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !field.is_choice() {
            field.value.clear();
        }
    }

    /// Step the current categorical field to the next (or previous) option.
    pub fn cycle_option(&mut self, forward: bool) {
        let field = &mut self.fields[self.selected_field];
        let FieldKind::Choice { options } = field.kind else {
            return;
        };
        let current = options
            .iter()
            .position(|o| *o == field.value)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % options.len()
        } else {
            (current + options.len() - 1) % options.len()
        };
        field.value = options[next].to_string();
        self.error_message = None;
    }

    /// Wipe all field buffers from memory and clear values.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Wipe the current values and restore the defaults.
    pub fn reset(&mut self) {
        self.clear_sensitive();
        *self = Self::default();
    }

    /// Show `input` in the form, keeping the cursor where it is.
    pub fn show_input(&mut self, input: &RawInput) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
        self.fields = fields_for(input);
    }

    /// Load a sample profile (hypertensive, overweight, sedentary).
    pub fn load_sample_data(&mut self) {
        let sample = RawInput {
            age: 52,
            gender: Gender::Female,
            height_cm: 162.0,
            weight_kg: 84.5,
            physical_activity: PhysicalActivity::Sedentary,
            glucose: 118,
            blood_pressure: 152,
            cholesterol: 235,
            severity: Severity::Moderate,
            exercise_hours: 1.5,
            adherence_chance: 65,
            disease_status: DiseaseStatus::Hypertension,
            cuisine: Cuisine::Italian,
            allergy_type: AllergyType::None,
            dietary_restrictions: DietaryRestriction::LowSodium,
            imbalance_score: 0.6,
            daily_calories: 2400,
        };
        self.show_input(&sample);
        self.error_message = None;
    }

    fn number(&self, idx: usize) -> Result<f64, String> {
        let field = &self.fields[idx];
        let FieldKind::Number { range, .. } = field.kind else {
            return Err(format!("{}: Not a numeric field", field.label));
        };
        let value: f64 = field
            .value
            .trim()
            .parse()
            .map_err(|_| format!("{}: Invalid number", field.label))?;
        Ok(range.clamp(value))
    }

    fn integer(&self, idx: usize) -> Result<u32, String> {
        // Clamped ranges are non-negative, so the cast cannot wrap.
        Ok(self.number(idx)?.round() as u32)
    }

    fn choice<T>(&self, idx: usize) -> Result<T, String>
    where
        T: FromStr<Err = ParseChoiceError>,
    {
        self.fields[idx]
            .value
            .parse::<T>()
            .map_err(|e| e.to_string())
    }

    /// Parse the form into a request, clamping numbers into their ranges.
    ///
    /// # Errors
    /// Returns a message naming the first field that is not a number.
    pub fn to_raw_input(&self) -> Result<RawInput, String> {
        let input = RawInput {
            age: self.integer(AGE)?,
            gender: self.choice(GENDER)?,
            height_cm: self.number(HEIGHT)?,
            weight_kg: self.number(WEIGHT)?,
            physical_activity: self.choice(ACTIVITY)?,
            glucose: self.integer(GLUCOSE)?,
            blood_pressure: self.integer(BLOOD_PRESSURE)?,
            cholesterol: self.integer(CHOLESTEROL)?,
            severity: self.choice(SEVERITY)?,
            exercise_hours: self.number(EXERCISE)?,
            adherence_chance: self.integer(ADHERENCE)?,
            disease_status: self.choice(DISEASE)?,
            cuisine: self.choice(CUISINE)?,
            allergy_type: self.choice(ALLERGY)?,
            dietary_restrictions: self.choice(RESTRICTION)?,
            imbalance_score: self.number(IMBALANCE)?,
            daily_calories: self.integer(CALORIES)?,
        };
        Ok(input.clamped())
    }

    /// BMI from the current height and weight, as the encoder would compute it.
    #[must_use]
    pub fn bmi_preview(&self) -> Option<f64> {
        let height = self.number(HEIGHT).ok()?;
        let weight = self.number(WEIGHT).ok()?;
        Some(compute_bmi(weight, height))
    }
}

fn bmi_category(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "Underweight"
    } else if bmi < 25.0 {
        "Normal weight"
    } else if bmi < 30.0 {
        "Overweight"
    } else {
        "Obese"
    }
}

/// Render the input form
pub fn render_form(
    f: &mut Frame,
    area: Rect,
    state: &FormState,
    status: &ModelStatus,
    model_path: &Path,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(4), // Model status
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_status_banner(f, chunks[1], status, model_path);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(chunks[2]);

    render_form_fields(f, body[0], state);
    render_bmi_panel(f, body[1], state);
    render_form_footer(f, chunks[3], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", DietTheme::text()),
        Span::styled("Diet Recommendation", DietTheme::title()),
        Span::styled(" │ Profile & Lifestyle", DietTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(DietTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_status_banner(f: &mut Frame, area: Rect, status: &ModelStatus, model_path: &Path) {
    let (lines, border) = match status {
        ModelStatus::Ready => (
            vec![Line::from(vec![
                Span::styled("● Model ready ", DietTheme::success()),
                Span::styled(model_path.display().to_string(), DietTheme::text_muted()),
            ])],
            DietTheme::border(),
        ),
        ModelStatus::Unavailable { reason } => (
            vec![
                Line::from(vec![
                    Span::styled("! ", DietTheme::danger()),
                    Span::styled(
                        format!(
                            "Model file not found or unusable at {}. Recommendations are disabled.",
                            model_path.display()
                        ),
                        DietTheme::danger(),
                    ),
                ]),
                Line::from(Span::styled(reason.clone(), DietTheme::text_muted())),
            ],
            DietTheme::danger(),
        ),
    };

    let banner = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(border));
    f.render_widget(banner, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &FormState) {
    let block = Block::default()
        .title(Span::styled(" Your Data ", DietTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(DietTheme::border_focused());

    let lines: Vec<Line> = state
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| field_line(field, i == state.selected_field))
        .collect();

    // Keep the selected row in view on short terminals.
    let visible = block.inner(area).height as usize;
    let offset = state
        .selected_field
        .saturating_sub(visible.saturating_sub(1));

    let content = Paragraph::new(lines)
        .block(block)
        .scroll((offset as u16, 0));
    f.render_widget(content, area);
}

fn field_line(field: &FormField, is_selected: bool) -> Line<'_> {
    let marker = if is_selected {
        Span::styled("▶ ", DietTheme::focused())
    } else {
        Span::raw("  ")
    };
    let label_style = if is_selected {
        DietTheme::focused()
    } else {
        DietTheme::text_secondary()
    };
    let label = Span::styled(format!("{:<20}", field.label), label_style);

    let mut spans = vec![marker, label];
    match field.kind {
        FieldKind::Choice { .. } if is_selected => {
            spans.push(Span::styled("◀ ", DietTheme::key_hint()));
            spans.push(Span::styled(field.value.as_str(), DietTheme::text()));
            spans.push(Span::styled(" ▶", DietTheme::key_hint()));
        }
        FieldKind::Choice { .. } => {
            spans.push(Span::styled(field.value.as_str(), DietTheme::text()));
        }
        FieldKind::Number { .. } => {
            if field.value.is_empty() {
                spans.push(Span::styled("—", DietTheme::text_muted()));
            } else {
                spans.push(Span::styled(field.value.as_str(), DietTheme::text()));
            }
            if is_selected {
                spans.push(Span::styled("▌", DietTheme::cursor()));
            }
            spans.push(Span::styled(format!("  {}", field.hint), DietTheme::text_muted()));
        }
    }
    Line::from(spans)
}

fn render_bmi_panel(f: &mut Frame, area: Rect, state: &FormState) {
    let block = Block::default()
        .title(Span::styled(" Calculated BMI ", DietTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(DietTheme::border());

    let lines = match state.bmi_preview() {
        Some(bmi) => vec![
            Line::from(""),
            Line::from(Span::styled(format!("{bmi:.2}"), DietTheme::bmi(bmi))),
            Line::from(Span::styled(bmi_category(bmi), DietTheme::text_secondary())),
        ],
        None => vec![
            Line::from(""),
            Line::from(Span::styled(
                "Enter height and weight",
                DietTheme::text_muted(),
            )),
        ],
    };

    let panel = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(panel, area);
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &FormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", DietTheme::danger()),
            Span::styled(err.clone(), DietTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", DietTheme::key_hint()),
            Span::styled("Navigate ", DietTheme::key_desc()),
            Span::styled("[←→] ", DietTheme::key_hint()),
            Span::styled("Change Option ", DietTheme::key_desc()),
            Span::styled("[Enter] ", DietTheme::key_hint()),
            Span::styled("Generate ", DietTheme::key_desc()),
            Span::styled("[S] ", DietTheme::key_hint()),
            Span::styled("Sample ", DietTheme::key_desc()),
            Span::styled("[R] ", DietTheme::key_hint()),
            Span::styled("Reset ", DietTheme::key_desc()),
            Span::styled("[Esc] ", DietTheme::key_hint()),
            Span::styled("Quit", DietTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(DietTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_form_is_default_input() {
        let form = FormState::default();
        assert_eq!(form.fields.len(), 17);
        assert_eq!(form.to_raw_input().expect("valid"), RawInput::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut form = FormState::default();
        form.fields[AGE].value = "150".into();
        form.fields[WEIGHT].value = "5".into();
        form.fields[IMBALANCE].value = "3".into();

        let input = form.to_raw_input().expect("valid");
        assert_eq!(input.age, 100);
        assert_eq!(input.weight_kg, 30.0);
        assert_eq!(input.imbalance_score, 1.0);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_empty_number_is_reported() {
        let mut form = FormState::default();
        form.selected_field = GLUCOSE;
        form.clear_field();
        let err = form.to_raw_input().expect_err("must fail");
        assert!(err.contains("Glucose"));
    }

    #[test]
    fn test_input_char_filters() {
        let mut form = FormState::default();
        form.selected_field = HEIGHT;
        form.clear_field();
        for c in "17x2.5.1".chars() {
            form.input_char(c);
        }
        assert_eq!(form.fields[HEIGHT].value, "172.51");

        form.selected_field = AGE;
        form.clear_field();
        for c in "4.2".chars() {
            form.input_char(c);
        }
        assert_eq!(form.fields[AGE].value, "42");
    }

    #[test]
    fn test_typing_into_choice_is_ignored() {
        let mut form = FormState::default();
        form.selected_field = GENDER;
        form.input_char('1');
        form.delete_char();
        form.clear_field();
        assert_eq!(form.fields[GENDER].value, "Male");
    }

    #[test]
    fn test_cycle_option_wraps() {
        let mut form = FormState::default();
        form.selected_field = DISEASE;
        form.cycle_option(false);
        assert_eq!(form.fields[DISEASE].value, "Unknown");
        form.cycle_option(true);
        assert_eq!(form.fields[DISEASE].value, "None/Healthy");
        form.cycle_option(true);
        assert_eq!(form.fields[DISEASE].value, "Hypertension");

        let input = form.to_raw_input().expect("valid");
        assert_eq!(input.disease_status, DiseaseStatus::Hypertension);
    }

    #[test]
    fn test_cycle_on_number_is_noop() {
        let mut form = FormState::default();
        form.selected_field = AGE;
        form.cycle_option(true);
        assert_eq!(form.fields[AGE].value, "25");
    }

    #[test]
    fn test_bmi_preview_matches_input() {
        let form = FormState::default();
        let preview = form.bmi_preview().expect("bmi");
        assert_eq!(preview, RawInput::default().bmi());
        assert!((preview - 24.22).abs() < 0.01);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut form = FormState::default();
        form.prev_field();
        assert_eq!(form.selected_field, CALORIES);
        form.next_field();
        assert_eq!(form.selected_field, AGE);
    }

    #[test]
    fn test_clear_sensitive_and_reset() {
        let mut form = FormState::default();
        form.load_sample_data();
        form.selected_field = WEIGHT;
        form.clear_sensitive();
        assert!(form.fields.iter().all(|f| f.value.is_empty()));
        assert_eq!(form.selected_field, 0);

        form.reset();
        assert_eq!(form.to_raw_input().expect("valid"), RawInput::default());
    }

    #[test]
    fn test_sample_data_is_valid() {
        let mut form = FormState::default();
        form.load_sample_data();
        let input = form.to_raw_input().expect("valid");
        assert!(input.validate().is_ok());
        assert_eq!(input.dietary_restrictions, DietaryRestriction::LowSodium);
    }

    #[test]
    fn test_bmi_categories() {
        assert_eq!(bmi_category(17.0), "Underweight");
        assert_eq!(bmi_category(24.2), "Normal weight");
        assert_eq!(bmi_category(27.0), "Overweight");
        assert_eq!(bmi_category(35.0), "Obese");
    }
}
