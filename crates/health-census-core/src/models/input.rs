//! Raw form input.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Patient fields exactly as a registration form submits them.
///
/// Every field is text; nothing here has been checked. Pass it through
/// [`crate::validation::validate_patient_input`] to obtain a draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PatientInput {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub phone: String,
    pub email: String,
    pub birth_date: String,
    pub address: String,
    pub condition: String,
    pub other_condition: String,
    pub severity: String,
    pub medication: String,
    pub weight: String,
    pub height: String,
}

impl PatientInput {
    /// Build from a field-name → value map. Unknown names are ignored.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let get = |key: &str| fields.get(key).cloned().unwrap_or_default();
        Self {
            name: get("name"),
            age: get("age"),
            gender: get("gender"),
            phone: get("phone"),
            email: get("email"),
            birth_date: get("birth_date"),
            address: get("address"),
            condition: get("condition"),
            other_condition: get("other_condition"),
            severity: get("severity"),
            medication: get("medication"),
            weight: get("weight"),
            height: get("height"),
        }
    }
}

/// Turn a form value into `None` when blank.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sample registrations used to demo the registry.
pub fn demo_patients() -> Vec<PatientInput> {
    vec![
        PatientInput {
            name: "María García López".into(),
            age: "45".into(),
            gender: "female".into(),
            phone: "555-0101".into(),
            email: "maria.garcia@email.com".into(),
            condition: "diabetes".into(),
            severity: "moderate".into(),
            weight: "68".into(),
            height: "165".into(),
            ..Default::default()
        },
        PatientInput {
            name: "Juan Pérez Martínez".into(),
            age: "32".into(),
            gender: "male".into(),
            phone: "555-0102".into(),
            email: "juan.perez@email.com".into(),
            condition: "hypertension".into(),
            severity: "mild".into(),
            weight: "75".into(),
            height: "178".into(),
            ..Default::default()
        },
        PatientInput {
            name: "Ana Rodríguez Silva".into(),
            age: "28".into(),
            gender: "female".into(),
            phone: "555-0103".into(),
            condition: "healthy".into(),
            weight: "60".into(),
            height: "162".into(),
            ..Default::default()
        },
    ]
}
