//! History sync plugin
//!
//! Imports transfer, download, and plugin history from a legacy NAStool
//! database into Medley's stores. Configuration arrives through
//! `initialize` (or the persisted settings blob); the import itself runs
//! as a background task so neither the trigger endpoint nor the caller of
//! `initialize` blocks on it.

use crate::sync::{RunSummary, SyncCoordinator, SyncSettings};
use crate::{AppState, SyncError};
use async_trait::async_trait;
use medley_common::db::settings as settings_db;
use medley_common::events::EventBus;
use medley_common::{Error, Result};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::{ApiDescriptor, ConfigForm, Plugin};

/// The history sync importer
pub struct HistorySyncPlugin {
    db: SqlitePool,
    event_bus: EventBus,
    run_lock: Arc<Mutex<()>>,
    last_run: Arc<RwLock<Option<RunSummary>>>,
    settings: std::sync::RwLock<SyncSettings>,
}

impl HistorySyncPlugin {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        run_lock: Arc<Mutex<()>>,
        last_run: Arc<RwLock<Option<RunSummary>>>,
    ) -> Self {
        Self {
            db,
            event_bus,
            run_lock,
            last_run,
            settings: std::sync::RwLock::new(SyncSettings::default()),
        }
    }

    /// Build a plugin instance sharing the service's state
    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.db.clone(),
            state.event_bus.clone(),
            state.run_lock.clone(),
            state.last_run.clone(),
        )
    }

    /// Load the persisted sync settings, if any
    pub async fn load_settings(db: &SqlitePool) -> Result<Option<SyncSettings>> {
        settings_db::get_json(db, SyncSettings::SETTINGS_KEY).await
    }

    /// Kick off a background sync run with the given settings
    ///
    /// The exclusivity token is acquired here and held inside the spawned
    /// task for the duration of the run; a second trigger while it is held
    /// reports `AlreadyRunning` instead of racing the source cursor.
    pub fn spawn_run(&self, settings: SyncSettings) -> std::result::Result<(), SyncError> {
        let guard = self
            .run_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| SyncError::AlreadyRunning)?;

        let db = self.db.clone();
        let event_bus = self.event_bus.clone();
        let last_run = self.last_run.clone();

        tokio::spawn(async move {
            let _guard = guard;
            let coordinator = SyncCoordinator::new(db, event_bus);
            let summary = coordinator.run(&settings).await;
            *last_run.write().await = Some(summary);
        });

        Ok(())
    }
}

#[async_trait]
impl Plugin for HistorySyncPlugin {
    fn id(&self) -> &'static str {
        "HistorySync"
    }

    fn name(&self) -> &'static str {
        "History Sync"
    }

    fn description(&self) -> &'static str {
        "Imports NAStool transfer, download, and plugin history into Medley."
    }

    async fn initialize(&self, config: Option<Value>) -> Result<()> {
        let Some(config) = config else {
            return Ok(());
        };

        let parsed: SyncSettings = serde_json::from_value(config)
            .map_err(|e| Error::InvalidInput(format!("history sync config: {e}")))?;

        settings_db::set_json(&self.db, SyncSettings::SETTINGS_KEY, &parsed).await?;
        *self
            .settings
            .write()
            .expect("settings lock poisoned") = parsed.clone();

        if !parsed.source_path.trim().is_empty() && parsed.any_enabled() {
            if let Err(e) = self.spawn_run(parsed) {
                tracing::warn!(error = %e, "History sync not started");
            }
        }

        Ok(())
    }

    fn describe_api(&self) -> Vec<ApiDescriptor> {
        vec![
            ApiDescriptor {
                path: "/sync/run".to_string(),
                method: "POST".to_string(),
                summary: "Start a history sync run with the persisted settings".to_string(),
            },
            ApiDescriptor {
                path: "/sync/status".to_string(),
                method: "GET".to_string(),
                summary: "Report the in-flight state and last run summary".to_string(),
            },
        ]
    }

    fn describe_config_form(&self) -> ConfigForm {
        ConfigForm {
            form: json!([
                {
                    "component": "VForm",
                    "content": [
                        { "component": "VSwitch",
                          "props": { "model": "clear", "label": "Clear existing history" } },
                        { "component": "VSwitch",
                          "props": { "model": "transfer", "label": "Transfer history" } },
                        { "component": "VSwitch",
                          "props": { "model": "plugin", "label": "Plugin history" } },
                        { "component": "VSwitch",
                          "props": { "model": "download", "label": "Download history" } },
                        { "component": "VTextField",
                          "props": { "model": "source_path",
                                     "label": "NAStool database (user.db) path" } },
                        { "component": "VTextarea",
                          "props": { "model": "path_map",
                                     "label": "Path remapping",
                                     "placeholder": "NAStool path:Medley path (one per line)" } },
                        { "component": "VTextarea",
                          "props": { "model": "downloader_map",
                                     "label": "Downloader remapping",
                                     "placeholder": "NAStool downloader id:qbittorrent|transmission (one per line)" } },
                        { "component": "VTextarea",
                          "props": { "model": "site_map",
                                     "label": "Site remapping",
                                     "placeholder": "NAStool site:Medley site (one per line)" } }
                    ]
                }
            ]),
            defaults: json!({
                "clear": false,
                "transfer": false,
                "plugin": false,
                "download": false,
                "source_path": "",
                "path_map": "",
                "downloader_map": "",
                "site_map": "",
            }),
        }
    }

    fn is_active(&self) -> bool {
        self.settings
            .read()
            .expect("settings lock poisoned")
            .any_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_plugin(db: SqlitePool) -> HistorySyncPlugin {
        HistorySyncPlugin::new(
            db,
            EventBus::new(16),
            Arc::new(Mutex::new(())),
            Arc::new(RwLock::new(None)),
        )
    }

    async fn setup_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        medley_common::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn initialize_persists_settings() {
        let pool = setup_db().await;
        let plugin = make_plugin(pool.clone());

        // No category enabled, so nothing spawns
        plugin
            .initialize(Some(json!({ "source_path": "/tmp/user.db", "clear": true })))
            .await
            .unwrap();

        let stored = HistorySyncPlugin::load_settings(&pool).await.unwrap().unwrap();
        assert!(stored.clear);
        assert_eq!(stored.source_path, "/tmp/user.db");
        assert!(!plugin.is_active());
    }

    #[tokio::test]
    async fn initialize_rejects_malformed_config() {
        let pool = setup_db().await;
        let plugin = make_plugin(pool);

        let result = plugin.initialize(Some(json!({ "clear": "yes please" }))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn active_when_any_category_enabled() {
        let pool = setup_db().await;
        let plugin = make_plugin(pool);

        plugin
            .initialize(Some(json!({ "download": true })))
            .await
            .unwrap();
        assert!(plugin.is_active());
    }

    #[tokio::test]
    async fn second_spawn_reports_already_running() {
        let pool = setup_db().await;
        let plugin = make_plugin(pool);

        // Hold the exclusivity token as a running import would
        let _held = plugin.run_lock.clone().try_lock_owned().unwrap();

        let result = plugin.spawn_run(SyncSettings::default());
        assert!(matches!(result, Err(SyncError::AlreadyRunning)));
    }

    #[tokio::test]
    async fn api_descriptors_cover_the_sync_routes() {
        let pool = setup_db().await;
        let plugin = make_plugin(pool);

        let api = plugin.describe_api();
        assert_eq!(api.len(), 2);
        assert!(api.iter().any(|d| d.method == "POST" && d.path == "/sync/run"));
        assert!(api.iter().any(|d| d.method == "GET" && d.path == "/sync/status"));
    }

    #[tokio::test]
    async fn config_form_defaults_cover_every_setting() {
        let pool = setup_db().await;
        let plugin = make_plugin(pool);

        let form = plugin.describe_config_form();
        let defaults: SyncSettings = serde_json::from_value(form.defaults).unwrap();
        assert_eq!(defaults, SyncSettings::default());
    }
}
