//! Registration input validation.
//!
//! Pipeline: PatientInput (raw text) → field rules → PatientDraft
//!
//! Every rule runs on every submission so the form can show all problems at
//! once; failures are collected into a [`ValidationReport`].

mod rules;

pub use rules::*;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::models::{non_blank, Condition, Gender, PatientDraft, PatientInput};

/// Form field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Age,
    Gender,
    Phone,
    Email,
    BirthDate,
    Condition,
    OtherCondition,
    Weight,
    Height,
}

impl Field {
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Age => "age",
            Field::Gender => "gender",
            Field::Phone => "phone",
            Field::Email => "email",
            Field::BirthDate => "birth_date",
            Field::Condition => "condition",
            Field::OtherCondition => "other_condition",
            Field::Weight => "weight",
            Field::Height => "height",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Why a field was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(Field),

    #[error("{field} must be at least {min} characters")]
    TooShort { field: Field, min: usize },

    #[error("{field} has an invalid format (expected {expected})")]
    InvalidFormat { field: Field, expected: &'static str },

    #[error("{0} must be a number")]
    NotANumber(Field),

    #[error("{field} must be {range}")]
    OutOfRange { field: Field, range: &'static str },

    #[error("{field} must be one of: {allowed}")]
    NotAllowed { field: Field, allowed: &'static str },
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Required(field) | ValidationError::NotANumber(field) => *field,
            ValidationError::TooShort { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::NotAllowed { field, .. } => *field,
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Every failure found in one submission, in form order.
#[derive(Error, Debug, Clone, PartialEq, Eq, Default)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Failures for one field.
    pub fn for_field(&self, field: Field) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.field() == field)
    }

    /// Record a rule outcome, keeping the value on success.
    fn check<T>(&mut self, result: ValidationResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }
}

/// Gender must be one of the enumerated values.
pub fn validate_gender(value: &str) -> ValidationResult<Gender> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(Field::Gender));
    }
    value.parse().map_err(|_| ValidationError::NotAllowed {
        field: Field::Gender,
        allowed: "male, female, other",
    })
}

/// Condition must be one of the enumerated values.
pub fn validate_condition(value: &str) -> ValidationResult<Condition> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(Field::Condition));
    }
    value.parse().map_err(|_| ValidationError::NotAllowed {
        field: Field::Condition,
        allowed: "healthy, diabetes, hypertension, asthma, heart_disease, obesity, arthritis, depression, anxiety, other",
    })
}

/// Run every rule over a submission.
///
/// Returns the typed draft when nothing failed, otherwise every failure.
pub fn validate_patient_input(input: &PatientInput) -> Result<PatientDraft, ValidationReport> {
    let mut report = ValidationReport::default();

    let name = report.check(validate_name(&input.name));
    let age = report.check(validate_age(&input.age));
    let gender = report.check(validate_gender(&input.gender));
    report.check(validate_phone(&input.phone));
    report.check(validate_email(&input.email));
    let birth_date = report.check(validate_birth_date(&input.birth_date));
    let condition = report.check(validate_condition(&input.condition));

    let other_condition = non_blank(&input.other_condition);
    if condition == Some(Condition::Other) && other_condition.is_none() {
        report.errors.push(ValidationError::Required(Field::OtherCondition));
    }

    let weight_kg = report.check(validate_measurement(Field::Weight, &input.weight));
    let height_cm = report.check(validate_measurement(Field::Height, &input.height));

    match (name, age, gender, birth_date, condition, weight_kg, height_cm) {
        (
            Some(_),
            Some(age),
            Some(gender),
            Some(birth_date),
            Some(condition),
            Some(weight_kg),
            Some(height_cm),
        ) if report.is_empty() => Ok(PatientDraft {
            name: input.name.trim().to_string(),
            age,
            gender,
            phone: non_blank(&input.phone),
            email: non_blank(&input.email),
            birth_date,
            address: non_blank(&input.address),
            condition,
            other_condition: if condition == Condition::Other {
                other_condition
            } else {
                None
            },
            severity: non_blank(&input.severity),
            medication: non_blank(&input.medication),
            weight_kg,
            height_cm,
        }),
        _ => Err(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> PatientInput {
        PatientInput {
            name: "  Juan Pérez ".into(),
            age: "32".into(),
            gender: "male".into(),
            email: "juan.perez@email.com".into(),
            condition: "hypertension".into(),
            severity: "mild".into(),
            weight: "75".into(),
            height: "178".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_input_yields_draft() {
        let draft = validate_patient_input(&valid_input()).unwrap();
        assert_eq!(draft.name, "Juan Pérez");
        assert_eq!(draft.age, 32);
        assert_eq!(draft.gender, Gender::Male);
        assert_eq!(draft.condition, Condition::Hypertension);
        assert_eq!(draft.severity.as_deref(), Some("mild"));
        assert_eq!(draft.phone, None);
        assert_eq!(draft.weight_kg, Some(75.0));
    }

    #[test]
    fn test_all_failures_are_reported() {
        let input = PatientInput {
            name: "J4".into(),
            age: "200".into(),
            gender: "".into(),
            phone: "call me".into(),
            email: "nope".into(),
            condition: "".into(),
            ..Default::default()
        };

        let report = validate_patient_input(&input).unwrap_err();
        let fields: Vec<Field> = report.errors.iter().map(|e| e.field()).collect();
        assert_eq!(
            fields,
            vec![
                Field::Name,
                Field::Age,
                Field::Gender,
                Field::Phone,
                Field::Email,
                Field::Condition
            ]
        );
    }

    #[test]
    fn test_other_condition_requires_text() {
        let mut input = valid_input();
        input.condition = "other".into();
        let report = validate_patient_input(&input).unwrap_err();
        assert_eq!(
            report.errors,
            vec![ValidationError::Required(Field::OtherCondition)]
        );

        input.other_condition = "migraine".into();
        let draft = validate_patient_input(&input).unwrap();
        assert_eq!(draft.other_condition.as_deref(), Some("migraine"));
    }

    #[test]
    fn test_other_condition_dropped_for_enumerated_condition() {
        let mut input = valid_input();
        input.other_condition = "leftover".into();
        let draft = validate_patient_input(&input).unwrap();
        assert_eq!(draft.other_condition, None);
    }

    #[test]
    fn test_unknown_gender_is_not_allowed() {
        let mut input = valid_input();
        input.gender = "robot".into();
        let report = validate_patient_input(&input).unwrap_err();
        assert!(matches!(
            report.errors[0],
            ValidationError::NotAllowed { field: Field::Gender, .. }
        ));
        assert_eq!(report.for_field(Field::Gender).count(), 1);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::Required(Field::Name).to_string(),
            "name is required"
        );
        assert_eq!(
            ValidationError::OutOfRange { field: Field::Age, range: "0 to 120" }.to_string(),
            "age must be 0 to 120"
        );
    }
}
