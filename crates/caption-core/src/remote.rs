use async_trait::async_trait;

use crate::errors::RemoteError;
use crate::record::TranscriptRow;

/// External transcript store, consumed as an interface.
///
/// `upsert` is keyed by row id on the server side (insert if absent,
/// replace if present) and is treated as all-or-nothing by callers: either
/// the whole batch is accepted or the call fails and no local state
/// changes. Authentication is carried in the implementation; callers pass
/// through whatever `user_id` each row holds and enforce nothing.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    fn name(&self) -> &str;

    async fn upsert(&self, table: &str, rows: &[TranscriptRow]) -> Result<(), RemoteError>;
}
