//! Runtime configuration.
//!
//! Resolved once at process startup and passed into the registry. The core
//! never reads environment variables; front ends do that and build a
//! [`CensusConfig`].

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "health_census";

const MAX_NAMESPACE_LEN: usize = 64;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("namespace cannot be empty")]
    EmptyNamespace,

    #[error("namespace exceeds maximum length of 64 characters")]
    NamespaceTooLong,

    #[error("namespace contains invalid characters (only alphanumeric, '.', '-', '_' allowed)")]
    InvalidNamespace,
}

/// Where the registry keeps its snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageLocation {
    /// SQLite file on disk
    File(PathBuf),
    /// Nothing survives the process
    InMemory,
}

/// Storage keys derived from a namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
    pub patients: String,
    pub counter: String,
}

impl StorageKeys {
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            patients: format!("{namespace}.patients"),
            counter: format!("{namespace}.counter"),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::for_namespace(DEFAULT_NAMESPACE)
    }
}

/// Census configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CensusConfig {
    storage: StorageLocation,
    namespace: String,
}

impl CensusConfig {
    /// Create a new `CensusConfig`.
    pub fn new(storage: StorageLocation, namespace: impl Into<String>) -> Result<Self, ConfigError> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;
        Ok(Self { storage, namespace })
    }

    /// In-memory storage under the default namespace.
    pub fn in_memory() -> Self {
        Self {
            storage: StorageLocation::InMemory,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn storage(&self) -> &StorageLocation {
        &self.storage
    }

    pub fn database_path(&self) -> Option<&Path> {
        match &self.storage {
            StorageLocation::File(path) => Some(path),
            StorageLocation::InMemory => None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::for_namespace(&self.namespace)
    }
}

/// Namespaces become key prefixes, so keep them to a small ASCII set.
pub fn validate_namespace(namespace: &str) -> Result<(), ConfigError> {
    if namespace.trim().is_empty() {
        return Err(ConfigError::EmptyNamespace);
    }
    if namespace.len() > MAX_NAMESPACE_LEN {
        return Err(ConfigError::NamespaceTooLong);
    }
    let ok = namespace
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));
    if !ok {
        return Err(ConfigError::InvalidNamespace);
    }
    Ok(())
}
