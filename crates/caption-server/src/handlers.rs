use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use caption_core::captions::CaptionFragment;
use caption_core::ids::UserId;
use caption_store::meta;
use caption_sync::reconciler::{SyncOutcome, SyncStatus};
use caption_sync::trigger::Trigger;

use crate::server::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Accept one caption fragment from the speech client. Finals come back
/// as the stored record; interims are acknowledged without a body.
pub async fn post_caption(
    State(state): State<AppState>,
    Json(fragment): Json<CaptionFragment>,
) -> Response {
    match state.ingest.accept(&fragment) {
        Ok(Some(record)) => (StatusCode::CREATED, Json(record)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, "caption ingest failed");
            store_unavailable(&e.to_string())
        }
    }
}

pub async fn list_transcripts(State(state): State<AppState>) -> Response {
    match state.repo.list() {
        Ok(all) => Json(all).into_response(),
        Err(e) => store_unavailable(&e.to_string()),
    }
}

/// Manual "sync now". Awaited so the caller sees the outcome; a request
/// landing while a sync is in flight gets 409 rather than a second upload.
pub async fn sync_now(State(state): State<AppState>) -> Response {
    match state.triggers.manual().await {
        SyncOutcome::Completed(ids) => (StatusCode::OK, Json(json!({ "synced": ids }))).into_response(),
        SyncOutcome::Skipped(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "sync already in flight" })),
        )
            .into_response(),
        SyncOutcome::Failed(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": e.to_string(), "kind": e.error_kind() })),
        )
            .into_response(),
    }
}

/// Browser-forwarded visibilitychange. Fire-and-forget; the attempt's
/// result lands in /sync/status.
pub async fn visibility_event(State(state): State<AppState>) -> StatusCode {
    state.triggers.fire(Trigger::VisibilityRestored);
    StatusCode::ACCEPTED
}

/// Browser-forwarded online event.
pub async fn online_event(State(state): State<AppState>) -> StatusCode {
    state.triggers.fire(Trigger::ConnectivityRestored);
    StatusCode::ACCEPTED
}

#[derive(Serialize)]
struct StatusResponse {
    status: SyncStatus,
    last_sync_at: Option<i64>,
    total: u64,
    unsynced: u64,
}

pub async fn sync_status(State(state): State<AppState>) -> Response {
    let counts = match state.repo.counts() {
        Ok(c) => c,
        Err(e) => return store_unavailable(&e.to_string()),
    };
    let last_sync_at = state.reconciler.last_sync_at().unwrap_or(None);
    let status = state.reconciler.status().borrow().clone();

    Json(StatusResponse {
        status,
        last_sync_at,
        total: counts.total,
        unsynced: counts.unsynced,
    })
    .into_response()
}

#[derive(Deserialize)]
pub struct SessionRequest {
    pub user_id: String,
}

/// Identity pass-through: the external provider authenticated the user,
/// we just hold the opaque id. Persisted so a restart restores it.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> StatusCode {
    if let Err(e) = state.meta.set(meta::LAST_USER_ID, &req.user_id) {
        warn!(error = %e, "failed to persist session");
    }
    state.auth.sign_in(UserId::from_raw(req.user_id));
    StatusCode::NO_CONTENT
}

pub async fn sign_out(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = state.meta.delete(meta::LAST_USER_ID) {
        warn!(error = %e, "failed to clear persisted session");
    }
    state.auth.sign_out();
    StatusCode::NO_CONTENT
}

fn store_unavailable(detail: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": detail })),
    )
        .into_response()
}
