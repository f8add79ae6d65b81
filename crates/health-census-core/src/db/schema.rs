//! SQLite schema definition.

/// Complete database schema for the census store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Key-value blobs (patient snapshot, identity counter)
-- ============================================================================

CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
