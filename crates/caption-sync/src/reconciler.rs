use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use caption_core::ids::{TranscriptId, UserId};
use caption_core::record::{now_ms, TranscriptRow};
use caption_core::remote::RemoteStore;
use caption_store::database::Database;
use caption_store::error::StoreError;
use caption_store::meta::{self, MetaRepo};
use caption_store::transcripts::TranscriptRepo;

use crate::backoff::{Backoff, BackoffConfig};
use crate::error::SyncError;

/// Where the reconciler currently stands, published for status surfaces.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Synced { count: usize, at: i64 },
    Failed { error: String, at: i64 },
}

/// Outcome of a guarded sync attempt.
#[derive(Debug)]
pub enum SyncOutcome {
    Completed(Vec<TranscriptId>),
    Skipped(SkipReason),
    Failed(SyncError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Another invocation holds the single-flight slot.
    InFlight,
    /// The backoff gate has not elapsed since the last failure.
    BackingOff,
}

pub struct ReconcilerConfig {
    /// Remote table receiving the batch upsert.
    pub table: String,
    pub backoff: BackoffConfig,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            table: "transcripts".into(),
            backoff: BackoffConfig::default(),
        }
    }
}

/// Uploads unsynced transcript records and marks them synced on success.
///
/// `push_unsynced` is the raw contract; `sync` is the guarded entry point
/// the trigger surface uses. Overlapping guarded invocations collapse via
/// a single-flight slot instead of double-uploading the same pending set.
pub struct Reconciler {
    repo: TranscriptRepo,
    meta: MetaRepo,
    remote: Arc<dyn RemoteStore>,
    table: String,
    inflight: tokio::sync::Mutex<()>,
    backoff: parking_lot::Mutex<Backoff>,
    status_tx: watch::Sender<SyncStatus>,
}

impl Reconciler {
    pub fn new(db: Database, remote: Arc<dyn RemoteStore>, config: ReconcilerConfig) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Self {
            repo: TranscriptRepo::new(db.clone()),
            meta: MetaRepo::new(db),
            remote,
            table: config.table,
            inflight: tokio::sync::Mutex::new(()),
            backoff: parking_lot::Mutex::new(Backoff::new(config.backoff)),
            status_tx,
        }
    }

    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Epoch ms of the last round that committed, if any.
    pub fn last_sync_at(&self) -> Result<Option<i64>, StoreError> {
        Ok(self
            .meta
            .get(meta::LAST_SYNC_AT)?
            .and_then(|s| s.parse().ok()))
    }

    /// One reconcile round: read every unsynced record, upsert the batch
    /// to the remote store, flip the batch synced on success.
    ///
    /// `user_id` is a fallback owner only; it never overwrites a
    /// record's own. Records still lacking an owner after the fallback
    /// are held back (the remote requires one), so with no identity in
    /// play they simply stay unsynced. An empty pending set returns
    /// immediately without touching the network. On failure nothing is
    /// flipped; the whole batch stays pending for a future round.
    ///
    /// Unguarded: concurrent calls may upload the same set twice, which
    /// the remote's idempotent upsert absorbs. Use `sync` for the
    /// collapsed version.
    #[instrument(skip(self, user_id), fields(remote = self.remote.name()))]
    pub async fn push_unsynced(
        &self,
        user_id: Option<&UserId>,
    ) -> Result<Vec<TranscriptId>, SyncError> {
        let pending = self.repo.unsynced()?;
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<TranscriptRow> = pending
            .iter()
            .map(|t| t.to_row(user_id))
            .filter(|r| r.user_id.is_some())
            .collect();

        let held_back = pending.len() - rows.len();
        if held_back > 0 {
            debug!(held_back, "holding back ownerless records until an identity is known");
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        self.remote.upsert(&self.table, &rows).await?;

        let ids: Vec<TranscriptId> = rows.into_iter().map(|r| r.id).collect();
        let flipped = self.repo.mark_synced(&ids)?;
        self.meta.set(meta::LAST_SYNC_AT, &now_ms().to_string())?;

        info!(pushed = ids.len(), flipped, "reconcile round committed");
        Ok(ids)
    }

    /// Guarded reconcile used by the trigger surface.
    ///
    /// Overlapping invocations are dropped, not queued: the one in flight
    /// already covers the same pending set. A manual trigger passes
    /// `force` to bypass the failure backoff gate; nothing bypasses the
    /// single-flight slot.
    pub async fn sync(&self, user_id: Option<&UserId>, force: bool) -> SyncOutcome {
        let Ok(_slot) = self.inflight.try_lock() else {
            return SyncOutcome::Skipped(SkipReason::InFlight);
        };

        if !force && !self.backoff.lock().ready() {
            return SyncOutcome::Skipped(SkipReason::BackingOff);
        }

        self.status_tx.send_replace(SyncStatus::Syncing);

        match self.push_unsynced(user_id).await {
            Ok(ids) => {
                self.backoff.lock().record_success();
                self.status_tx.send_replace(SyncStatus::Synced {
                    count: ids.len(),
                    at: now_ms(),
                });
                SyncOutcome::Completed(ids)
            }
            Err(e) => {
                let suggested = match &e {
                    SyncError::Remote(r) => r.suggested_delay(),
                    SyncError::Store(_) => None,
                };
                self.backoff.lock().record_failure(suggested);
                self.status_tx.send_replace(SyncStatus::Failed {
                    error: e.to_string(),
                    at: now_ms(),
                });
                SyncOutcome::Failed(e)
            }
        }
    }

    pub fn repo(&self) -> &TranscriptRepo {
        &self.repo
    }
}
