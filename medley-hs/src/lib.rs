//! medley-hs library interface
//!
//! Exposes the history sync pipeline and its HTTP surface for
//! integration testing.

pub mod api;
pub mod error;
pub mod legacy;
pub mod normalize;
pub mod plugins;
pub mod remap;
pub mod stores;
pub mod sync;

pub use crate::error::{ApiError, ApiResult, SyncError};

use axum::Router;
use medley_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Destination database connection pool
    pub db: SqlitePool,
    /// Event bus for sync progress broadcasting
    pub event_bus: EventBus,
    /// Exclusivity token: held for the duration of a sync run
    pub run_lock: Arc<Mutex<()>>,
    /// Summary of the most recent run, for the status endpoint
    pub last_run: Arc<RwLock<Option<sync::RunSummary>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus) -> Self {
        Self {
            db,
            event_bus,
            run_lock: Arc::new(Mutex::new(())),
            last_run: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::sync_routes())
        .merge(api::health_routes())
        .with_state(state)
}
