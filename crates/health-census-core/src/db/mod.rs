//! Storage layer for the census.
//!
//! The registry only needs a string key-value store: one key holds the
//! serialized patient list, another the next identity. [`Database`] keeps
//! those blobs in SQLite; [`MemoryStore`] keeps them in a map.

mod kv;
mod memory;
mod schema;

pub use memory::*;
pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt value under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("No patient identities left to assign")]
    IdsExhausted,
}

pub type DbResult<T> = Result<T, DbError>;

/// String key-value persistence used by the repository.
///
/// A missing key means "no prior data".
pub trait KeyValueStore {
    fn get(&self, key: &str) -> DbResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> DbResult<()>;

    /// Delete a key. Returns whether it existed.
    fn remove(&mut self, key: &str) -> DbResult<bool>;
}

/// SQLite-backed [`KeyValueStore`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the registry file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening registry database");
        Self::with_schema(Connection::open(path)?)
    }

    /// Registry that lives only as long as this value.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}
