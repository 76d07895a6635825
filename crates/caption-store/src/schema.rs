use rusqlite::Connection;

use crate::error::StoreError;

/// SQL DDL for the caption-store database.
///
/// `transcripts` carries the two secondary access paths the sync subsystem
/// needs: recency (`updated`) and sync state (`synced`). `meta` is a plain
/// key-value side table (last successful sync time and the like).
pub const SCHEMA_VERSION: u32 = 1;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS transcripts (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    updated INTEGER NOT NULL,
    user_id TEXT,
    synced INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transcripts_updated ON transcripts(updated);
CREATE INDEX IF NOT EXISTS idx_transcripts_synced ON transcripts(synced);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;

/// Bring an open database up to `SCHEMA_VERSION`.
///
/// Table creation is idempotent, so a missing store is created on first
/// open and an existing one is left untouched. The version row gates
/// stepwise migrations; a database stamped newer than this build is
/// refused rather than silently rewritten.
pub fn migrate(conn: &Connection) -> Result<u32, StoreError> {
    conn.execute_batch(CREATE_TABLES)
        .map_err(|e| StoreError::Database(format!("schema: {e}")))?;

    let version: Option<u32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    match version {
        None => {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map_err(|e| StoreError::Database(format!("schema version: {e}")))?;
            Ok(SCHEMA_VERSION)
        }
        Some(v) if v == SCHEMA_VERSION => Ok(v),
        Some(v) if v < SCHEMA_VERSION => {
            // Stepwise upgrades land here as the schema evolves. Version 1
            // has no predecessors, so this only stamps the new version.
            conn.execute("UPDATE schema_version SET version = ?1", [SCHEMA_VERSION])
                .map_err(|e| StoreError::Database(format!("schema version: {e}")))?;
            Ok(SCHEMA_VERSION)
        }
        Some(v) => Err(StoreError::Database(format!(
            "database schema version {v} is newer than supported {SCHEMA_VERSION}"
        ))),
    }
}
