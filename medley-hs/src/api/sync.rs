//! Sync trigger and status endpoints
//!
//! The trigger is fire-and-forget: it acknowledges immediately and the
//! import proceeds as a background task. Completion is observable through
//! GET /sync/status and the event bus, never through the trigger response.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::plugins::HistorySyncPlugin;
use crate::sync::{RunSummary, SyncSettings};
use crate::{AppState, SyncError};

/// POST /sync/run response
#[derive(Debug, Serialize)]
pub struct StartSyncResponse {
    pub status: String,
}

/// GET /sync/status response
#[derive(Debug, Serialize)]
pub struct SyncStatusResponse {
    /// Whether a run is in flight right now
    pub running: bool,
    /// Summary of the most recent finished run
    pub last_run: Option<RunSummary>,
}

/// POST /sync/run
///
/// Start a sync run using the persisted settings. Returns 202 Accepted
/// once the background task is spawned, 409 when a run is already in
/// flight, and 400 when the sync has never been configured.
pub async fn start_sync(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<StartSyncResponse>)> {
    let settings: Option<SyncSettings> =
        medley_common::db::settings::get_json(&state.db, SyncSettings::SETTINGS_KEY).await?;

    let Some(settings) = settings else {
        return Err(ApiError::BadRequest(
            "history sync is not configured".to_string(),
        ));
    };
    if settings.source_path.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "history sync source path is not configured".to_string(),
        ));
    }

    let plugin = HistorySyncPlugin::from_state(&state);
    match plugin.spawn_run(settings) {
        Ok(()) => {
            tracing::info!("History sync run accepted");
            Ok((
                StatusCode::ACCEPTED,
                Json(StartSyncResponse {
                    status: "started".to_string(),
                }),
            ))
        }
        Err(SyncError::AlreadyRunning) => Err(ApiError::Conflict(
            "a sync run is already in progress".to_string(),
        )),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

/// GET /sync/status
///
/// Report whether a run is in flight and the outcome of the last one.
pub async fn sync_status(State(state): State<AppState>) -> Json<SyncStatusResponse> {
    // The exclusivity token doubles as the liveness signal
    let running = state.run_lock.try_lock().is_err();
    let last_run = state.last_run.read().await.clone();

    Json(SyncStatusResponse { running, last_run })
}

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/sync/run", post(start_sync))
        .route("/sync/status", get(sync_status))
}
