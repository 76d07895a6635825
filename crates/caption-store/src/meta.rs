use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Key for the epoch-ms timestamp of the last successful reconcile.
pub const LAST_SYNC_AT: &str = "last_sync_at";

/// Key for the opaque user id restored at startup.
pub const LAST_USER_ID: &str = "last_user_id";

/// Plain key-value side table for small durable state.
pub struct MetaRepo {
    db: Database,
}

impl MetaRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT value FROM meta WHERE key = ?1")?;
            let mut rows = stmt.query([key])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_helpers::get(row, 0, "meta", "value")?)),
                None => Ok(None),
            }
        })
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                rusqlite::params![key, value],
            )?;
            Ok(())
        })
    }

    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM meta WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}
