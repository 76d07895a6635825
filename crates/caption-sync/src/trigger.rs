use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::AuthHandle;
use crate::reconciler::{Reconciler, SyncOutcome};

/// Events that invoke the reconciler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    AppStart,
    VisibilityRestored,
    ConnectivityRestored,
    Manual,
}

impl Trigger {
    /// Event triggers only fire for a signed-in user; a manual sync is
    /// honored regardless (ownerless records then just stay pending).
    pub fn requires_identity(&self) -> bool {
        !matches!(self, Self::Manual)
    }

    /// A deliberate user action overrides the failure backoff gate.
    pub fn bypasses_backoff(&self) -> bool {
        matches!(self, Self::Manual)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppStart => "app_start",
            Self::VisibilityRestored => "visibility_restored",
            Self::ConnectivityRestored => "connectivity_restored",
            Self::Manual => "manual",
        }
    }
}

/// Invokes the reconciler in response to app and connectivity events.
///
/// Policy only: no state beyond handles to the reconciler and the auth
/// watch. Every firing is fire-and-forget relative to the caller;
/// failures are logged and land in `SyncStatus`, never propagated.
#[derive(Clone)]
pub struct TriggerSurface {
    reconciler: Arc<Reconciler>,
    auth: AuthHandle,
}

impl TriggerSurface {
    pub fn new(reconciler: Arc<Reconciler>, auth: AuthHandle) -> Self {
        Self { reconciler, auth }
    }

    /// Fire a trigger. Returns None when policy drops it outright
    /// (event trigger with nobody signed in); otherwise the spawned
    /// attempt's handle, which callers are free to ignore.
    pub fn fire(&self, trigger: Trigger) -> Option<JoinHandle<SyncOutcome>> {
        let user = self.auth.current();
        if trigger.requires_identity() && user.is_none() {
            debug!(trigger = trigger.as_str(), "trigger dropped: no user identity");
            return None;
        }

        let reconciler = Arc::clone(&self.reconciler);
        Some(tokio::spawn(async move {
            let outcome = reconciler
                .sync(user.as_ref(), trigger.bypasses_backoff())
                .await;
            match &outcome {
                SyncOutcome::Completed(ids) => {
                    info!(trigger = trigger.as_str(), synced = ids.len(), "sync completed");
                }
                SyncOutcome::Skipped(reason) => {
                    debug!(trigger = trigger.as_str(), ?reason, "sync skipped");
                }
                SyncOutcome::Failed(e) => {
                    warn!(
                        trigger = trigger.as_str(),
                        kind = e.error_kind(),
                        error = %e,
                        "sync failed; records stay pending"
                    );
                }
            }
            outcome
        }))
    }

    /// Manual "sync now": same policy as `fire(Manual)` but awaited, so
    /// the control that asked can show the result.
    pub async fn manual(&self) -> SyncOutcome {
        self.reconciler.sync(self.auth.current().as_ref(), true).await
    }
}
