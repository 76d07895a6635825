use serde::Serialize;
use tracing::instrument;

use caption_core::ids::{TranscriptId, UserId};
use caption_core::record::{now_ms, Transcript};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Aggregate counts for the sync-status surface.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct StoreCounts {
    pub total: u64,
    pub unsynced: u64,
}

const SELECT_COLUMNS: &str = "id, text, updated, user_id, synced";

pub struct TranscriptRepo {
    db: Database,
}

impl TranscriptRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert-or-replace a record, refreshing `updated` to now.
    /// Saving an existing id overwrites it; the returned record carries
    /// the timestamp actually written.
    #[instrument(skip(self, t), fields(id = %t.id))]
    pub fn save(&self, t: &Transcript) -> Result<Transcript, StoreError> {
        let updated = now_ms();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO transcripts (id, text, updated, user_id, synced)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     text = excluded.text,
                     updated = excluded.updated,
                     user_id = excluded.user_id,
                     synced = excluded.synced",
                rusqlite::params![
                    t.id.as_str(),
                    t.text,
                    updated,
                    t.user_id.as_ref().map(|u| u.as_str()),
                    t.synced as i64,
                ],
            )?;
            Ok(Transcript {
                updated,
                ..t.clone()
            })
        })
    }

    /// Get a record by id.
    pub fn get(&self, id: &TranscriptId) -> Result<Transcript, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM transcripts WHERE id = ?1"
            ))?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_transcript(row),
                None => Err(StoreError::NotFound(format!("transcript {id}"))),
            }
        })
    }

    /// All records, ordered by `updated` ascending (recency index order;
    /// id breaks timestamp ties the way a keyed index would).
    pub fn list(&self) -> Result<Vec<Transcript>, StoreError> {
        self.query_all(&format!(
            "SELECT {SELECT_COLUMNS} FROM transcripts ORDER BY updated ASC, id ASC"
        ))
    }

    /// Records still awaiting upload, oldest first.
    pub fn unsynced(&self) -> Result<Vec<Transcript>, StoreError> {
        self.query_all(&format!(
            "SELECT {SELECT_COLUMNS} FROM transcripts WHERE synced = 0 ORDER BY updated ASC, id ASC"
        ))
    }

    /// Flip `synced` to true for the given ids, refreshing `updated`, in
    /// one transaction: readers never observe a partially flipped batch.
    /// Ids with no matching record are silently skipped. Returns how many
    /// rows were actually flipped.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub fn mark_synced(&self, ids: &[TranscriptId]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let updated = now_ms();
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let mut flipped = 0;
            {
                let mut stmt =
                    tx.prepare("UPDATE transcripts SET synced = 1, updated = ?1 WHERE id = ?2")?;
                for id in ids {
                    flipped += stmt.execute(rusqlite::params![updated, id.as_str()])?;
                }
            }
            tx.commit()?;
            Ok(flipped)
        })
    }

    pub fn counts(&self) -> Result<StoreCounts, StoreError> {
        self.db.with_conn(|conn| {
            let (total, unsynced): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COUNT(*) FILTER (WHERE synced = 0) FROM transcripts",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(StoreCounts {
                total: total as u64,
                unsynced: unsynced as u64,
            })
        })
    }

    fn query_all(&self, sql: &str) -> Result<Vec<Transcript>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_transcript(row)?);
            }
            Ok(results)
        })
    }
}

fn row_to_transcript(row: &rusqlite::Row<'_>) -> Result<Transcript, StoreError> {
    Ok(Transcript {
        id: TranscriptId::from_raw(row_helpers::get::<String>(row, 0, "transcripts", "id")?),
        text: row_helpers::get(row, 1, "transcripts", "text")?,
        updated: row_helpers::get(row, 2, "transcripts", "updated")?,
        user_id: row_helpers::get_opt::<String>(row, 3, "transcripts", "user_id")?
            .map(UserId::from_raw),
        synced: row_helpers::get::<i64>(row, 4, "transcripts", "synced")? != 0,
    })
}
