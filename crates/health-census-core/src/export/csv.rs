//! CSV export of the patient registry.

use crate::models::Patient;

/// Header row of the patient export.
pub const CSV_HEADER: &str =
    "Name,Age,Gender,Condition,Severity,Phone,Email,BMI,Registered";

/// Suggested file name for downloads.
pub const CSV_FILE_NAME: &str = "census_patients.csv";

/// Export every patient as CSV, one row per record in registration order.
///
/// Text fields are always double-quoted; the age is a bare number.
pub fn patients_to_csv(patients: &[Patient]) -> String {
    let mut csv = String::new();

    // Header
    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for patient in patients {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            quote_csv(&patient.name),
            patient.age,
            quote_csv(patient.gender.code()),
            quote_csv(patient.resolved_condition()),
            quote_csv(patient.severity.as_deref().unwrap_or("")),
            quote_csv(patient.phone.as_deref().unwrap_or("")),
            quote_csv(patient.email.as_deref().unwrap_or("")),
            quote_csv(&patient.bmi.map(|b| format!("{b:.1}")).unwrap_or_default()),
            quote_csv(&patient.registered_at.format("%Y-%m-%d").to_string()),
        ));
    }

    csv
}

/// Wrap a field in double quotes, doubling any embedded quote.
fn quote_csv(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
