use caption_core::errors::RemoteError;
use caption_store::error::StoreError;

/// Errors crossing the reconciler boundary. Either kind leaves every
/// record in the attempted batch unsynced; nothing is lost.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("local store: {0}")]
    Store(#[from] StoreError),

    #[error("remote store: {0}")]
    Remote(#[from] RemoteError),
}

impl SyncError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Store(_) => "store_unavailable",
            Self::Remote(e) => e.error_kind(),
        }
    }
}
