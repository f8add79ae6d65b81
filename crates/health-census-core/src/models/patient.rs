//! Patient models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::MAX_AGE;

/// Patient gender as captured by the registration form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// All genders in display order.
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    /// Canonical storage code.
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Gender {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "masculino" => Ok(Gender::Male),
            "female" | "femenino" => Ok(Gender::Female),
            "other" | "otro" => Ok(Gender::Other),
            other => Err(UnknownCode(other.to_string())),
        }
    }
}

/// Health condition selected on the form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Healthy,
    Diabetes,
    Hypertension,
    Asthma,
    HeartDisease,
    Obesity,
    Arthritis,
    Depression,
    Anxiety,
    /// Free text carried in [`Patient::other_condition`]
    Other,
}

impl Condition {
    pub fn code(&self) -> &'static str {
        match self {
            Condition::Healthy => "healthy",
            Condition::Diabetes => "diabetes",
            Condition::Hypertension => "hypertension",
            Condition::Asthma => "asthma",
            Condition::HeartDisease => "heart_disease",
            Condition::Obesity => "obesity",
            Condition::Arthritis => "arthritis",
            Condition::Depression => "depression",
            Condition::Anxiety => "anxiety",
            Condition::Other => "other",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Condition {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The registration form may submit the Spanish codes.
        match s.trim().to_lowercase().as_str() {
            "healthy" | "saludable" => Ok(Condition::Healthy),
            "diabetes" => Ok(Condition::Diabetes),
            "hypertension" | "hipertension" => Ok(Condition::Hypertension),
            "asthma" | "asma" => Ok(Condition::Asthma),
            "heart_disease" | "cardiopatia" => Ok(Condition::HeartDisease),
            "obesity" | "obesidad" => Ok(Condition::Obesity),
            "arthritis" | "artritis" => Ok(Condition::Arthritis),
            "depression" | "depresion" => Ok(Condition::Depression),
            "anxiety" | "ansiedad" => Ok(Condition::Anxiety),
            "other" | "otra" => Ok(Condition::Other),
            other => Err(UnknownCode(other.to_string())),
        }
    }
}

/// Code that matches no enumerated value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown code: {0}")]
pub struct UnknownCode(pub String);

/// Stored record that breaks a registration rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("patient {id}: age {age} is out of range")]
    AgeOutOfRange { id: u64, age: u8 },

    #[error("patient {id}: {field} {value} is not a positive number")]
    InvalidMeasurement {
        id: u64,
        field: &'static str,
        value: f64,
    },

    #[error("patient {id}: condition \"other\" has no description")]
    MissingOtherCondition { id: u64 },
}

/// Fixed age bands used for grouping and reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    /// Under 18
    Minor,
    /// 18 to 29
    YoungAdult,
    /// 30 to 49
    Adult,
    /// 50 to 64
    OlderAdult,
    /// 65 and over
    Senior,
}

impl AgeBracket {
    pub fn label(&self) -> &'static str {
        match self {
            AgeBracket::Minor => "minor",
            AgeBracket::YoungAdult => "young adult",
            AgeBracket::Adult => "adult",
            AgeBracket::OlderAdult => "older adult",
            AgeBracket::Senior => "senior",
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed patient data that has not been assigned an identity yet.
///
/// Form input becomes a draft through
/// [`crate::validation::validate_patient_input`]; a draft built by hand is
/// trusted as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientDraft {
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub condition: Condition,
    pub other_condition: Option<String>,
    pub severity: Option<String>,
    pub medication: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
}

/// A registered patient.
///
/// Records are never edited after registration. `bmi` is derived from
/// `weight_kg` and `height_cm` when the record is built or reloaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Repository-assigned identity, never reused
    pub id: u64,
    pub name: String,
    /// Age in years, 0..=120
    pub age: u8,
    pub gender: Gender,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    pub condition: Condition,
    /// Free-text condition, meaningful only when `condition` is `Other`
    #[serde(default)]
    pub other_condition: Option<String>,
    /// Severity label (e.g. "mild", "moderate")
    #[serde(default)]
    pub severity: Option<String>,
    /// Medication notes
    #[serde(default)]
    pub medication: Option<String>,
    /// Weight in kg
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Height in cm
    #[serde(default)]
    pub height_cm: Option<f64>,
    /// Body-mass index, one decimal
    #[serde(default)]
    pub bmi: Option<f64>,
    /// Registration timestamp
    pub registered_at: DateTime<Utc>,
}

impl Patient {
    /// Build a patient from a validated draft.
    pub fn new(id: u64, draft: PatientDraft, registered_at: DateTime<Utc>) -> Self {
        let bmi = bmi(draft.weight_kg, draft.height_cm);
        Self {
            id,
            name: draft.name,
            age: draft.age,
            gender: draft.gender,
            phone: draft.phone,
            email: draft.email,
            birth_date: draft.birth_date,
            address: draft.address,
            condition: draft.condition,
            other_condition: draft.other_condition,
            severity: draft.severity,
            medication: draft.medication,
            weight_kg: draft.weight_kg,
            height_cm: draft.height_cm,
            bmi,
            registered_at,
        }
    }

    /// Check a deserialized record and recompute derived fields.
    pub(crate) fn rehydrate(mut self) -> Result<Self, RecordError> {
        if i64::from(self.age) > MAX_AGE {
            return Err(RecordError::AgeOutOfRange {
                id: self.id,
                age: self.age,
            });
        }
        for (field, value) in [("weight_kg", self.weight_kg), ("height_cm", self.height_cm)] {
            if let Some(value) = value.filter(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(RecordError::InvalidMeasurement {
                    id: self.id,
                    field,
                    value,
                });
            }
        }
        if self.condition == Condition::Other
            && self.other_condition.as_deref().map_or(true, |t| t.trim().is_empty())
        {
            return Err(RecordError::MissingOtherCondition { id: self.id });
        }

        self.bmi = bmi(self.weight_kg, self.height_cm);
        Ok(self)
    }

    pub fn resolved_condition(&self) -> &str {
        resolved_condition(self)
    }

    pub fn age_bracket(&self) -> AgeBracket {
        age_bracket(self.age)
    }
}

/// Body-mass index from weight (kg) and height (cm), rounded to one decimal.
///
/// Absent when either input is missing or not strictly positive.
pub fn bmi(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    match (weight_kg, height_cm) {
        (Some(w), Some(h)) if w > 0.0 && h > 0.0 => {
            let meters = h / 100.0;
            Some(round_one_decimal(w / (meters * meters)))
        }
        _ => None,
    }
}

/// Age band for an age in years. Each band includes its lower bound.
pub fn age_bracket(age: u8) -> AgeBracket {
    match age {
        0..=17 => AgeBracket::Minor,
        18..=29 => AgeBracket::YoungAdult,
        30..=49 => AgeBracket::Adult,
        50..=64 => AgeBracket::OlderAdult,
        _ => AgeBracket::Senior,
    }
}

/// Effective condition label: the free text for `Other`, else the code.
pub fn resolved_condition(patient: &Patient) -> &str {
    match patient.condition {
        Condition::Other => patient.other_condition.as_deref().unwrap_or(""),
        ref condition => condition.code(),
    }
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
pub(crate) fn sample_draft(name: &str, age: u8, gender: Gender, condition: Condition) -> PatientDraft {
    PatientDraft {
        name: name.to_string(),
        age,
        gender,
        phone: None,
        email: None,
        birth_date: None,
        address: None,
        condition,
        other_condition: None,
        severity: None,
        medication: None,
        weight_kg: None,
        height_cm: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_known_value() {
        assert_eq!(bmi(Some(68.0), Some(165.0)), Some(25.0));
        assert_eq!(bmi(Some(75.0), Some(178.0)), Some(23.7));
    }

    #[test]
    fn test_bmi_missing_inputs() {
        assert_eq!(bmi(None, Some(165.0)), None);
        assert_eq!(bmi(Some(68.0), None), None);
        assert_eq!(bmi(None, None), None);
    }

    #[test]
    fn test_age_bracket_boundaries() {
        assert_eq!(age_bracket(0), AgeBracket::Minor);
        assert_eq!(age_bracket(17), AgeBracket::Minor);
        assert_eq!(age_bracket(18), AgeBracket::YoungAdult);
        assert_eq!(age_bracket(29), AgeBracket::YoungAdult);
        assert_eq!(age_bracket(30), AgeBracket::Adult);
        assert_eq!(age_bracket(49), AgeBracket::Adult);
        assert_eq!(age_bracket(50), AgeBracket::OlderAdult);
        assert_eq!(age_bracket(64), AgeBracket::OlderAdult);
        assert_eq!(age_bracket(65), AgeBracket::Senior);
        assert_eq!(age_bracket(120), AgeBracket::Senior);
    }

    #[test]
    fn test_resolved_condition() {
        let mut draft = sample_draft("Ana", 28, Gender::Female, Condition::Other);
        draft.other_condition = Some("migraine".into());
        let patient = Patient::new(1, draft, Utc::now());
        assert_eq!(patient.resolved_condition(), "migraine");

        let patient = Patient::new(
            2,
            sample_draft("Juan", 32, Gender::Male, Condition::Diabetes),
            Utc::now(),
        );
        assert_eq!(patient.resolved_condition(), "diabetes");
    }

    #[test]
    fn test_new_patient_computes_bmi() {
        let mut draft = sample_draft("María", 45, Gender::Female, Condition::Diabetes);
        draft.weight_kg = Some(68.0);
        draft.height_cm = Some(165.0);
        let patient = Patient::new(7, draft, Utc::now());
        assert_eq!(patient.id, 7);
        assert_eq!(patient.bmi, Some(25.0));
        assert_eq!(patient.age_bracket(), AgeBracket::Adult);
    }

    #[test]
    fn test_codes_accept_spanish_aliases() {
        assert_eq!("masculino".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!("Female".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("hipertension".parse::<Condition>(), Ok(Condition::Hypertension));
        assert_eq!("otra".parse::<Condition>(), Ok(Condition::Other));
        assert!("unknown".parse::<Condition>().is_err());
    }

    #[test]
    fn test_rehydrate_recomputes_bmi() {
        let mut draft = sample_draft("Ana", 28, Gender::Female, Condition::Healthy);
        draft.weight_kg = Some(60.0);
        draft.height_cm = Some(162.0);
        let mut patient = Patient::new(3, draft, Utc::now());
        patient.bmi = Some(99.0);
        assert_eq!(patient.rehydrate().unwrap().bmi, Some(22.9));
    }

    #[test]
    fn test_rehydrate_rejects_age_over_limit() {
        let mut patient = Patient::new(
            4,
            sample_draft("Ana", 28, Gender::Female, Condition::Healthy),
            Utc::now(),
        );
        patient.age = 200;
        assert_eq!(
            patient.rehydrate(),
            Err(RecordError::AgeOutOfRange { id: 4, age: 200 })
        );
    }

    #[test]
    fn test_rehydrate_rejects_bad_measurements() {
        let base = Patient::new(
            5,
            sample_draft("Juan", 32, Gender::Male, Condition::Healthy),
            Utc::now(),
        );

        let mut negative = base.clone();
        negative.weight_kg = Some(-5.0);
        assert!(matches!(
            negative.rehydrate(),
            Err(RecordError::InvalidMeasurement { field: "weight_kg", .. })
        ));

        let mut infinite = base.clone();
        infinite.height_cm = Some(f64::INFINITY);
        assert!(matches!(
            infinite.rehydrate(),
            Err(RecordError::InvalidMeasurement { field: "height_cm", .. })
        ));

        let mut zero = base;
        zero.height_cm = Some(0.0);
        assert!(zero.rehydrate().is_err());
    }

    #[test]
    fn test_rehydrate_requires_other_description() {
        let patient = Patient::new(
            6,
            sample_draft("Luis", 70, Gender::Male, Condition::Other),
            Utc::now(),
        );
        assert_eq!(
            patient.clone().rehydrate(),
            Err(RecordError::MissingOtherCondition { id: 6 })
        );

        let mut blank = patient;
        blank.other_condition = Some("  ".into());
        assert!(blank.rehydrate().is_err());
    }
}
