//! Patient repository.
//!
//! Sole owner of the in-memory collection and of identity assignment. Every
//! mutation is followed by a save of the full snapshot; a failed save is
//! logged and reported back but never rolls back the in-memory change.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::config::StorageKeys;
use crate::db::{DbError, DbResult, KeyValueStore};
use crate::models::{Patient, PatientDraft};
use crate::query::{search, SearchCriteria};

/// What happened when the stored snapshot was read at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    /// No prior data
    Empty,
    /// Snapshot restored
    Restored { count: usize },
    /// Snapshot unreadable; started from an empty registry
    Reset { reason: String },
}

/// Non-blocking notice that the latest change was not saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceWarning {
    pub message: String,
}

impl fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "changes were not saved: {}", self.message)
    }
}

impl From<&DbError> for PersistenceWarning {
    fn from(e: &DbError) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

/// Result of registering a patient.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub patient: Patient,
    /// Present when the record is held in memory only
    pub warning: Option<PersistenceWarning>,
}

/// Patient collection plus the next identity to hand out.
pub struct Repository<S: KeyValueStore> {
    store: S,
    keys: StorageKeys,
    patients: Vec<Patient>,
    next_id: u64,
}

impl<S: KeyValueStore> Repository<S> {
    /// Create an empty repository without reading the store.
    pub fn new(store: S, keys: StorageKeys) -> Self {
        Self {
            store,
            keys,
            patients: Vec::new(),
            next_id: 1,
        }
    }

    /// Create a repository and load any stored snapshot.
    pub fn open(store: S, keys: StorageKeys) -> (Self, LoadStatus) {
        let mut repo = Self::new(store, keys);
        let status = repo.load();
        (repo, status)
    }

    /// Replace the in-memory state with the stored snapshot.
    ///
    /// An unreadable snapshot resets to an empty registry with counter 1.
    pub fn load(&mut self) -> LoadStatus {
        match self.read_snapshot() {
            Ok(None) => {
                self.patients.clear();
                self.next_id = 1;
                LoadStatus::Empty
            }
            Ok(Some((patients, next_id))) => {
                let count = patients.len();
                self.patients = patients;
                self.next_id = next_id;
                tracing::info!(count, next_id, "restored patient snapshot");
                LoadStatus::Restored { count }
            }
            Err(e) => {
                tracing::warn!("failed to load patient snapshot, starting empty: {}", e);
                self.patients.clear();
                self.next_id = 1;
                LoadStatus::Reset {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn read_snapshot(&self) -> DbResult<Option<(Vec<Patient>, u64)>> {
        let stored_patients = self.store.get(&self.keys.patients)?;
        let stored_counter = self.store.get(&self.keys.counter)?;

        if stored_patients.is_none() && stored_counter.is_none() {
            return Ok(None);
        }

        let patients: Vec<Patient> = match stored_patients {
            Some(json) => serde_json::from_str::<Vec<Patient>>(&json)?
                .into_iter()
                .map(|patient| {
                    patient.rehydrate().map_err(|e| DbError::Corrupt {
                        key: self.keys.patients.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<DbResult<_>>()?,
            None => Vec::new(),
        };

        let mut seen = HashSet::with_capacity(patients.len());
        for patient in &patients {
            if !seen.insert(patient.id) {
                return Err(DbError::Corrupt {
                    key: self.keys.patients.clone(),
                    reason: format!("duplicate patient id {}", patient.id),
                });
            }
        }

        let counter = match stored_counter {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| DbError::Corrupt {
                key: self.keys.counter.clone(),
                reason: e.to_string(),
            })?,
            None => 1,
        };

        // Never hand out an id that is already taken, even if the counter lags.
        let floor = match patients.iter().map(|p| p.id).max() {
            Some(max) => max.checked_add(1).ok_or_else(|| DbError::Corrupt {
                key: self.keys.patients.clone(),
                reason: format!("patient id {max} leaves no identity to assign"),
            })?,
            None => 1,
        };
        Ok(Some((patients, counter.max(floor))))
    }

    /// Register a validated draft under the next identity.
    ///
    /// Fails only when the identity space is used up; a failed save is
    /// reported through [`Registration::warning`] instead.
    pub fn add(&mut self, draft: PatientDraft) -> DbResult<Registration> {
        self.add_at(draft, Utc::now())
    }

    /// Register with an explicit registration timestamp.
    pub fn add_at(
        &mut self,
        draft: PatientDraft,
        registered_at: DateTime<Utc>,
    ) -> DbResult<Registration> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(DbError::IdsExhausted)?;

        let patient = Patient::new(id, draft, registered_at);
        self.patients.push(patient.clone());
        tracing::debug!(id, "registered patient");

        let warning = self.persist_or_warn();
        Ok(Registration { patient, warning })
    }

    /// Save the full collection and the identity counter.
    pub fn persist(&mut self) -> DbResult<()> {
        let snapshot = serde_json::to_string(&self.patients)?;
        self.store.set(&self.keys.patients, &snapshot)?;
        self.store
            .set(&self.keys.counter, &self.next_id.to_string())?;
        tracing::debug!(count = self.patients.len(), "persisted patient snapshot");
        Ok(())
    }

    fn persist_or_warn(&mut self) -> Option<PersistenceWarning> {
        match self.persist() {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("failed to persist patient snapshot: {}", e);
                Some(PersistenceWarning::from(&e))
            }
        }
    }

    /// Drop every record and restart identities at 1.
    pub fn clear(&mut self) -> Option<PersistenceWarning> {
        self.patients.clear();
        self.next_id = 1;
        tracing::info!("cleared patient registry");
        self.persist_or_warn()
    }

    /// All records in registration order.
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn get(&self, id: u64) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Identity the next registration will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Filter the current collection.
    pub fn search(&self, criteria: &SearchCriteria) -> Vec<&Patient> {
        search(&self.patients, criteria)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
