//! Sync coordinator
//!
//! Orchestrates one history import run: validates the remap rules, opens
//! the legacy source, processes each enabled category sequentially
//! (truncate-if-clearing, extract, normalize, write), and persists the
//! updated settings so a re-trigger is idempotent. Per-record failures are
//! absorbed here; nothing escapes past the coordinator except through the
//! run summary, counters, and logs.

use crate::error::is_systemic;
use crate::legacy::LegacySource;
use crate::normalize::{normalize_download, normalize_plugin, normalize_transfer};
use crate::remap::{parse_rules, RemapRule};
use crate::stores::{
    DbDownloadStore, DbPluginDataStore, DbTransferStore, DownloadStore, PluginDataStore,
    TransferStore,
};
use crate::SyncError;
use chrono::{DateTime, Utc};
use medley_common::db::settings as settings_db;
use medley_common::events::{EventBus, MedleyEvent};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Persisted configuration for a sync run
///
/// Stored as JSON in the settings table; the coordinator writes it back
/// with `clear` and the completed category flags reset after a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Truncate each enabled destination store before importing into it
    #[serde(default)]
    pub clear: bool,
    /// Filesystem path of the legacy database
    #[serde(default)]
    pub source_path: String,
    /// Newline-delimited path remap rules
    #[serde(default)]
    pub path_map: String,
    /// Newline-delimited downloader-index remap rules
    #[serde(default)]
    pub downloader_map: String,
    /// Newline-delimited site-name remap rules
    #[serde(default)]
    pub site_map: String,
    /// Import transfer history
    #[serde(default)]
    pub transfer: bool,
    /// Import plugin history
    #[serde(default)]
    pub plugin: bool,
    /// Import download history
    #[serde(default)]
    pub download: bool,
}

impl SyncSettings {
    /// Settings-table key the configuration is persisted under
    pub const SETTINGS_KEY: &'static str = "plugin.HistorySync";

    /// Whether any import category is enabled
    pub fn any_enabled(&self) -> bool {
        self.transfer || self.plugin || self.download
    }
}

/// Import categories, processed sequentially in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Transfer,
    Plugin,
    Download,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Transfer => "transfer",
            Category::Plugin => "plugin",
            Category::Download => "download",
        }
    }
}

/// Run state, advanced per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// No run in progress
    Idle,
    /// Reading raw rows from the legacy source
    Extracting(Category),
    /// Converting raw rows into canonical records
    Normalizing(Category),
    /// Writing records through the store adapters
    Writing(Category),
    /// All enabled categories processed
    Completed,
    /// Fatal error before or between categories
    Aborted,
}

/// Per-category outcome counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    /// Records written to the destination store
    pub written: u64,
    /// Records discarded by normalization rules
    pub skipped: u64,
    /// Records dropped on per-record errors
    pub failed: u64,
    /// Wall-clock seconds spent on the category
    pub elapsed_seconds: u64,
    /// Category-fatal condition (truncate failure, systemic store loss)
    pub error: Option<String>,
}

impl CategoryReport {
    /// Whether the category ran to the end of its record stream
    pub fn is_clean(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one sync run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub state: RunState,
    pub transfer: Option<CategoryReport>,
    pub plugin: Option<CategoryReport>,
    pub download: Option<CategoryReport>,
    /// Fatal error that aborted the run, if any
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            state: RunState::Idle,
            transfer: None,
            plugin: None,
            download: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// History sync coordinator
///
/// Owns the lifetime of a run. Store adapters and the event bus are
/// injected at construction; `new` wires the SQLite-backed stores over the
/// shared destination pool, `with_stores` exists for tests.
pub struct SyncCoordinator {
    db: SqlitePool,
    event_bus: EventBus,
    transfer_store: Arc<dyn TransferStore>,
    download_store: Arc<dyn DownloadStore>,
    plugin_store: Arc<dyn PluginDataStore>,
    state: std::sync::Mutex<RunState>,
}

impl SyncCoordinator {
    /// Create a coordinator writing to the destination database
    pub fn new(db: SqlitePool, event_bus: EventBus) -> Self {
        let transfer_store = Arc::new(DbTransferStore::new(db.clone()));
        let download_store = Arc::new(DbDownloadStore::new(db.clone()));
        let plugin_store = Arc::new(DbPluginDataStore::new(db.clone()));
        Self::with_stores(db, event_bus, transfer_store, download_store, plugin_store)
    }

    /// Create a coordinator with explicit store adapters
    pub fn with_stores(
        db: SqlitePool,
        event_bus: EventBus,
        transfer_store: Arc<dyn TransferStore>,
        download_store: Arc<dyn DownloadStore>,
        plugin_store: Arc<dyn PluginDataStore>,
    ) -> Self {
        Self {
            db,
            event_bus,
            transfer_store,
            download_store,
            plugin_store,
            state: std::sync::Mutex::new(RunState::Idle),
        }
    }

    /// Execute one sync run
    ///
    /// Never fails outward: fatal conditions end up in the summary's
    /// `error` field with state `Aborted`.
    pub async fn run(&self, settings: &SyncSettings) -> RunSummary {
        let mut summary = RunSummary::new();

        tracing::info!(
            source = %settings.source_path,
            clear = settings.clear,
            transfer = settings.transfer,
            plugin = settings.plugin,
            download = settings.download,
            "Starting history sync run"
        );
        self.event_bus.emit_lossy(MedleyEvent::SyncRunStarted {
            timestamp: Utc::now(),
        });

        match self.execute(settings, &mut summary).await {
            Ok(()) => {
                self.transition(RunState::Completed);
                summary.state = RunState::Completed;
                self.event_bus.emit_lossy(MedleyEvent::SyncRunCompleted {
                    timestamp: Utc::now(),
                });
                tracing::info!("History sync run completed");
            }
            Err(e) => {
                self.transition(RunState::Aborted);
                summary.state = RunState::Aborted;
                summary.error = Some(e.to_string());
                self.event_bus.emit_lossy(MedleyEvent::SyncRunFailed {
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                tracing::error!(error = %e, "History sync run aborted");
            }
        }

        summary.finished_at = Some(Utc::now());
        summary
    }

    async fn execute(
        &self,
        settings: &SyncSettings,
        summary: &mut RunSummary,
    ) -> Result<(), SyncError> {
        // All rule sets are validated up front, before the source is opened
        let path_rules = parse_rules(&settings.path_map)?;
        let downloader_rules = parse_rules(&settings.downloader_map)?;
        let site_rules = parse_rules(&settings.site_map)?;

        let source = LegacySource::open(Path::new(&settings.source_path)).await?;

        let result = self
            .run_categories(
                &source,
                settings,
                &path_rules,
                &downloader_rules,
                &site_rules,
                summary,
            )
            .await;

        // The source connection is scoped to the run; release it whether or
        // not the categories succeeded
        source.close().await;
        result?;

        self.write_back_settings(settings, summary).await
    }

    async fn run_categories(
        &self,
        source: &LegacySource,
        settings: &SyncSettings,
        path_rules: &[RemapRule],
        downloader_rules: &[RemapRule],
        site_rules: &[RemapRule],
        summary: &mut RunSummary,
    ) -> Result<(), SyncError> {
        if settings.transfer {
            summary.transfer = Some(
                self.sync_transfer(source, settings.clear, path_rules)
                    .await?,
            );
        }
        if settings.plugin {
            summary.plugin = Some(
                self.sync_plugin(source, settings.clear, downloader_rules)
                    .await?,
            );
        }
        if settings.download {
            summary.download = Some(
                self.sync_download(source, settings.clear, site_rules)
                    .await?,
            );
        }
        Ok(())
    }

    /// Import legacy transfer history
    async fn sync_transfer(
        &self,
        source: &LegacySource,
        clear: bool,
        path_rules: &[RemapRule],
    ) -> Result<CategoryReport, SyncError> {
        let category = Category::Transfer;
        let started = Instant::now();
        let mut report = CategoryReport::default();
        tracing::info!("Syncing legacy transfer history");

        if clear {
            if let Err(e) = self.transfer_store.truncate().await {
                return Ok(self.abandon_category(category, report, started, &e.into()));
            }
            tracing::info!("Existing transfer history cleared");
        }

        self.transition(RunState::Extracting(category));
        let rows = source.transfer_history().await?;

        self.transition(RunState::Normalizing(category));
        for raw in rows {
            let Some(record) = normalize_transfer(raw, path_rules) else {
                report.skipped += 1;
                continue;
            };

            self.transition(RunState::Writing(category));
            match self.transfer_store.append(&record).await {
                Ok(()) => {
                    report.written += 1;
                    tracing::debug!(
                        title = record.title.as_deref().unwrap_or(""),
                        dest = %record.dest,
                        "Transfer record imported"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, dest = %record.dest, "Transfer record write failed");
                    report.failed += 1;
                    if is_systemic(&e) {
                        return Ok(self.abandon_category(category, report, started, &e.into()));
                    }
                }
            }
        }

        Ok(self.finish_category(category, report, started))
    }

    /// Import legacy plugin history
    async fn sync_plugin(
        &self,
        source: &LegacySource,
        clear: bool,
        downloader_rules: &[RemapRule],
    ) -> Result<CategoryReport, SyncError> {
        let category = Category::Plugin;
        let started = Instant::now();
        let mut report = CategoryReport::default();
        tracing::info!("Syncing legacy plugin history");

        if clear {
            if let Err(e) = self.plugin_store.truncate().await {
                return Ok(self.abandon_category(category, report, started, &e.into()));
            }
            tracing::info!("Existing plugin data cleared");
        }

        self.transition(RunState::Extracting(category));
        let rows = source.plugin_history().await?;

        self.transition(RunState::Normalizing(category));
        for raw in rows {
            let key = raw.key.clone();
            let record = match normalize_plugin(raw, downloader_rules) {
                Ok(record) => record,
                Err(e) => {
                    // Scoped to this record; the import continues
                    tracing::warn!(key = %key, error = %e, "Plugin record dropped");
                    report.failed += 1;
                    continue;
                }
            };

            self.transition(RunState::Writing(category));
            match self
                .plugin_store
                .upsert(&record.plugin_id, &record.key, &record.value)
                .await
            {
                Ok(()) => report.written += 1,
                Err(e) => {
                    tracing::warn!(key = %record.key, error = %e, "Plugin record write failed");
                    report.failed += 1;
                    if is_systemic(&e) {
                        return Ok(self.abandon_category(category, report, started, &e.into()));
                    }
                }
            }
        }

        Ok(self.finish_category(category, report, started))
    }

    /// Import legacy download history
    async fn sync_download(
        &self,
        source: &LegacySource,
        clear: bool,
        site_rules: &[RemapRule],
    ) -> Result<CategoryReport, SyncError> {
        let category = Category::Download;
        let started = Instant::now();
        let mut report = CategoryReport::default();
        tracing::info!("Syncing legacy download history");

        if clear {
            if let Err(e) = self.download_store.truncate().await {
                return Ok(self.abandon_category(category, report, started, &e.into()));
            }
            tracing::info!("Existing download history cleared");
        }

        self.transition(RunState::Extracting(category));
        let rows = source.download_history().await?;

        self.transition(RunState::Normalizing(category));
        for raw in rows {
            let record = normalize_download(raw, site_rules);

            self.transition(RunState::Writing(category));
            match self.download_store.append(&record).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    tracing::warn!(error = %e, path = %record.path, "Download record write failed");
                    report.failed += 1;
                    if is_systemic(&e) {
                        return Ok(self.abandon_category(category, report, started, &e.into()));
                    }
                }
            }
        }

        Ok(self.finish_category(category, report, started))
    }

    /// Persist updated settings after a completed run
    ///
    /// `clear` is always reset; each category flag is reset only when its
    /// import ran cleanly, so an abandoned category re-imports on the next
    /// trigger without reconfiguration.
    async fn write_back_settings(
        &self,
        settings: &SyncSettings,
        summary: &RunSummary,
    ) -> Result<(), SyncError> {
        let mut updated = settings.clone();
        updated.clear = false;
        if summary.transfer.as_ref().is_some_and(|r| r.is_clean()) {
            updated.transfer = false;
        }
        if summary.plugin.as_ref().is_some_and(|r| r.is_clean()) {
            updated.plugin = false;
        }
        if summary.download.as_ref().is_some_and(|r| r.is_clean()) {
            updated.download = false;
        }

        settings_db::set_json(&self.db, SyncSettings::SETTINGS_KEY, &updated)
            .await
            .map_err(SyncError::Store)?;
        tracing::info!("Sync settings updated; completed categories disabled");
        Ok(())
    }

    /// Close out a category that ran to the end of its record stream
    fn finish_category(
        &self,
        category: Category,
        mut report: CategoryReport,
        started: Instant,
    ) -> CategoryReport {
        report.elapsed_seconds = started.elapsed().as_secs();
        tracing::info!(
            category = category.as_str(),
            written = report.written,
            skipped = report.skipped,
            failed = report.failed,
            elapsed_seconds = report.elapsed_seconds,
            "Category sync finished"
        );
        self.emit_category(category, &report);
        report
    }

    /// Close out a category on a category-fatal condition
    fn abandon_category(
        &self,
        category: Category,
        mut report: CategoryReport,
        started: Instant,
        error: &SyncError,
    ) -> CategoryReport {
        report.elapsed_seconds = started.elapsed().as_secs();
        report.error = Some(error.to_string());
        tracing::warn!(
            category = category.as_str(),
            written = report.written,
            failed = report.failed,
            error = %error,
            "Category sync abandoned"
        );
        self.emit_category(category, &report);
        report
    }

    fn emit_category(&self, category: Category, report: &CategoryReport) {
        self.event_bus.emit_lossy(MedleyEvent::SyncCategoryCompleted {
            category: category.as_str().to_string(),
            written: report.written,
            skipped: report.skipped,
            failed: report.failed,
            elapsed_seconds: report.elapsed_seconds,
            timestamp: Utc::now(),
        });
    }

    fn transition(&self, next: RunState) {
        let mut state = self.state.lock().expect("run state lock poisoned");
        let current = *state;
        if current != next {
            tracing::debug!(from = ?current, to = ?next, "Run state transition");
            *state = next;
        }
    }
}
