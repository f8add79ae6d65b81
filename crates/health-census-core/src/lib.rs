//! Health Census Core Library
//!
//! Local-first patient registry: capture, lookup and aggregate reporting.
//!
//! # Architecture
//!
//! ```text
//! Form input → Validation → PatientDraft
//!                               │
//!                       Repository.add ──► KeyValueStore (snapshot + counter)
//!                               │
//!               ┌───────────────┼───────────────┐
//!               │               │               │
//!               ▼               ▼               ▼
//!            Search       Stats/Reports      CSV Export
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, Gender, Condition, AgeBracket)
//! - [`validation`]: Field rules and whole-form validation
//! - [`db`]: Key-value storage (SQLite and in-memory)
//! - [`repository`]: Patient collection, identities and persistence
//! - [`query`]: Filtered lookup
//! - [`stats`]: Groupings, summary statistics, reports and chart series
//! - [`export`]: CSV export
//! - [`config`]: Runtime configuration

pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod query;
pub mod repository;
pub mod stats;
pub mod validation;

// Re-export commonly used types
pub use config::{CensusConfig, StorageKeys, StorageLocation};
pub use db::{Database, KeyValueStore, MemoryStore};
pub use models::{AgeBracket, Condition, Gender, Patient, PatientDraft, PatientInput};
pub use query::SearchCriteria;
pub use repository::{LoadStatus, PersistenceWarning, Registration, Repository};
pub use stats::{Report, ReportKind, Summary};
pub use validation::{validate_patient_input, ValidationError, ValidationReport};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CensusError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for CensusError {
    fn from(e: db::DbError) -> Self {
        CensusError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for CensusError {
    fn from(e: serde_json::Error) -> Self {
        CensusError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for CensusError {
    fn from(e: config::ConfigError) -> Self {
        CensusError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for CensusError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CensusError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a registry stored at the given path.
#[uniffi::export]
pub fn open_registry(path: String, namespace: String) -> Result<Arc<HealthCensusCore>, CensusError> {
    let config = CensusConfig::new(StorageLocation::File(path.into()), namespace)?;
    HealthCensusCore::from_config(&config).map(Arc::new)
}

/// Create a registry that lives only in memory (for testing).
#[uniffi::export]
pub fn open_registry_in_memory(namespace: String) -> Result<Arc<HealthCensusCore>, CensusError> {
    let config = CensusConfig::new(StorageLocation::InMemory, namespace)?;
    HealthCensusCore::from_config(&config).map(Arc::new)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe registry wrapper for FFI.
#[derive(uniffi::Object)]
pub struct HealthCensusCore {
    repo: Mutex<Repository<Database>>,
    load_status: LoadStatus,
}

impl HealthCensusCore {
    /// Open the configured store and load its snapshot.
    pub fn from_config(config: &CensusConfig) -> Result<Self, CensusError> {
        let db = match config.storage() {
            StorageLocation::File(path) => Database::open(path)?,
            StorageLocation::InMemory => Database::open_in_memory()?,
        };
        let (repo, load_status) = Repository::open(db, config.storage_keys());
        Ok(Self {
            repo: Mutex::new(repo),
            load_status,
        })
    }
}

#[uniffi::export]
impl HealthCensusCore {
    // =========================================================================
    // Registration
    // =========================================================================

    /// Validate and register a patient.
    ///
    /// Validation failures come back in `errors`, never as an `Err`.
    pub fn register_patient(
        &self,
        input: FfiPatientInput,
    ) -> Result<FfiRegistration, CensusError> {
        let input: PatientInput = input.into();
        match validate_patient_input(&input) {
            Ok(draft) => {
                let mut repo = self.repo.lock()?;
                let registration = repo.add(draft)?;
                Ok(FfiRegistration {
                    patient: Some(registration.patient.into()),
                    errors: Vec::new(),
                    warning: registration.warning.map(|w| w.to_string()),
                })
            }
            Err(report) => Ok(FfiRegistration {
                patient: None,
                errors: report.errors.into_iter().map(|e| e.into()).collect(),
                warning: None,
            }),
        }
    }

    /// Notice about the snapshot read at startup, if it could not be used.
    pub fn load_warning(&self) -> Option<String> {
        match &self.load_status {
            LoadStatus::Reset { reason } => Some(format!("saved data could not be loaded: {reason}")),
            LoadStatus::Empty | LoadStatus::Restored { .. } => None,
        }
    }

    /// Remove every patient. Returns a warning if the reset was not saved.
    pub fn clear(&self) -> Result<Option<String>, CensusError> {
        let mut repo = self.repo.lock()?;
        Ok(repo.clear().map(|w| w.to_string()))
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// All patients in registration order.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, CensusError> {
        let repo = self.repo.lock()?;
        Ok(repo.patients().iter().map(|p| p.clone().into()).collect())
    }

    /// Search with raw form criteria.
    pub fn search_patients(
        &self,
        criteria: FfiSearchCriteria,
    ) -> Result<Vec<FfiPatient>, CensusError> {
        let criteria = SearchCriteria::from_form(
            &criteria.name,
            &criteria.condition,
            &criteria.min_age,
            &criteria.max_age,
        );
        let repo = self.repo.lock()?;
        let found = repo.search(&criteria);
        tracing::debug!(matches = found.len(), "patient search");
        Ok(found.into_iter().map(|p| p.clone().into()).collect())
    }

    // =========================================================================
    // Statistics and Reports
    // =========================================================================

    /// Headline figures.
    pub fn summary(&self) -> Result<FfiSummary, CensusError> {
        let repo = self.repo.lock()?;
        Ok(stats::summarize(repo.patients()).into())
    }

    /// Generate a report as JSON. Unknown kinds yield the "unavailable" report.
    pub fn generate_report_json(&self, kind: String) -> Result<String, CensusError> {
        let repo = self.repo.lock()?;
        let report = stats::generate_report(&kind, repo.patients());
        let envelope = serde_json::json!({ "title": report.title(), "report": report });
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Detailed distributions as JSON (`null` with no data).
    pub fn statistics_json(&self) -> Result<String, CensusError> {
        let repo = self.repo.lock()?;
        Ok(serde_json::to_string(&stats::detailed_statistics(repo.patients()))?)
    }

    /// Chart series as JSON.
    pub fn chart_data_json(&self) -> Result<String, CensusError> {
        let repo = self.repo.lock()?;
        Ok(serde_json::to_string(&stats::chart_data(repo.patients()))?)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export every patient as CSV.
    pub fn export_csv(&self) -> Result<String, CensusError> {
        let repo = self.repo.lock()?;
        Ok(export::patients_to_csv(repo.patients()))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe raw form input.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiPatientInput {
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

impl From<FfiPatientInput> for PatientInput {
    fn from(input: FfiPatientInput) -> Self {
        PatientInput {
            name: input.name,
            age: input.age,
            gender: input.gender,
            phone: input.phone,
            email: input.email,
            birth_date: input.birth_date,
            address: input.address,
            condition: input.condition,
            other_condition: input.other_condition,
            severity: input.severity,
            medication: input.medication,
            weight: input.weight,
            height: input.height,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: u64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<String>,
    pub address: Option<String>,
    /// Resolved condition label
    pub condition: String,
    pub severity: Option<String>,
    pub medication: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub bmi: Option<f64>,
    pub age_bracket: String,
    pub registered_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            condition: patient.resolved_condition().to_string(),
            age_bracket: patient.age_bracket().label().to_string(),
            id: patient.id,
            name: patient.name,
            age: u32::from(patient.age),
            gender: patient.gender.code().to_string(),
            phone: patient.phone,
            email: patient.email,
            birth_date: patient.birth_date.map(|d| d.to_string()),
            address: patient.address,
            severity: patient.severity,
            medication: patient.medication,
            weight_kg: patient.weight_kg,
            height_cm: patient.height_cm,
            bmi: patient.bmi,
            registered_at: patient.registered_at.to_rfc3339(),
        }
    }
}

/// FFI-safe field failure.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldError {
    pub field: String,
    pub message: String,
}

impl From<ValidationError> for FfiFieldError {
    fn from(e: ValidationError) -> Self {
        Self {
            field: e.field().key().to_string(),
            message: e.to_string(),
        }
    }
}

/// FFI-safe registration outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRegistration {
    /// Registered patient, absent when validation failed
    pub patient: Option<FfiPatient>,
    pub errors: Vec<FfiFieldError>,
    /// Set when the patient is held in memory only
    pub warning: Option<String>,
}

/// FFI-safe search form.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiSearchCriteria {
    pub name: String,
    pub condition: String,
    pub min_age: String,
    pub max_age: String,
}

/// FFI-safe summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSummary {
    pub total: u32,
    pub average_age: Option<f64>,
    pub most_common_condition: Option<String>,
}

impl From<Summary> for FfiSummary {
    fn from(summary: Summary) -> Self {
        match summary {
            Summary::NoData => Self {
                total: 0,
                average_age: None,
                most_common_condition: None,
            },
            Summary::Populated {
                total,
                average_age,
                most_common_condition,
            } => Self {
                total: total as u32,
                average_age: Some(average_age),
                most_common_condition: Some(most_common_condition),
            },
        }
    }
}
