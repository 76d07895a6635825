pub mod auth;
pub mod backoff;
pub mod error;
pub mod ingest;
pub mod mock;
pub mod reconciler;
pub mod remote_http;
pub mod trigger;

pub use auth::AuthHandle;
pub use error::SyncError;
pub use ingest::CaptionIngest;
pub use reconciler::{Reconciler, ReconcilerConfig, SkipReason, SyncOutcome, SyncStatus};
pub use remote_http::{HttpRemote, HttpRemoteConfig};
pub use trigger::{Trigger, TriggerSurface};
