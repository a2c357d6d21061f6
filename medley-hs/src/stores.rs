//! Destination store adapters
//!
//! The coordinator writes through these traits rather than touching the
//! database directly, so tests can substitute recording or failing doubles.
//! The SQLite-backed implementations are thin delegates to the
//! medley-common store operation modules.

use async_trait::async_trait;
use medley_common::db::models::{DownloadRecord, TransferRecord};
use medley_common::db::{download_history, plugin_data, transfer_history};
use medley_common::Result;
use sqlx::SqlitePool;

/// Create-only transfer-history sink
#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn append(&self, record: &TransferRecord) -> Result<()>;
    async fn truncate(&self) -> Result<()>;
}

/// Create-only download-history sink
#[async_trait]
pub trait DownloadStore: Send + Sync {
    async fn append(&self, record: &DownloadRecord) -> Result<()>;
    async fn truncate(&self) -> Result<()>;
}

/// Plugin-data sink; `(plugin_id, key)` is an upsert key
#[async_trait]
pub trait PluginDataStore: Send + Sync {
    async fn upsert(&self, plugin_id: &str, key: &str, value: &str) -> Result<()>;
    async fn truncate(&self) -> Result<()>;
}

/// SQLite-backed transfer-history store
pub struct DbTransferStore {
    pool: SqlitePool,
}

impl DbTransferStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransferStore for DbTransferStore {
    async fn append(&self, record: &TransferRecord) -> Result<()> {
        transfer_history::append(&self.pool, record).await
    }

    async fn truncate(&self) -> Result<()> {
        transfer_history::truncate(&self.pool).await
    }
}

/// SQLite-backed download-history store
pub struct DbDownloadStore {
    pool: SqlitePool,
}

impl DbDownloadStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DownloadStore for DbDownloadStore {
    async fn append(&self, record: &DownloadRecord) -> Result<()> {
        download_history::append(&self.pool, record).await
    }

    async fn truncate(&self) -> Result<()> {
        download_history::truncate(&self.pool).await
    }
}

/// SQLite-backed plugin-data store
pub struct DbPluginDataStore {
    pool: SqlitePool,
}

impl DbPluginDataStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PluginDataStore for DbPluginDataStore {
    async fn upsert(&self, plugin_id: &str, key: &str, value: &str) -> Result<()> {
        plugin_data::upsert(&self.pool, plugin_id, key, value).await
    }

    async fn truncate(&self) -> Result<()> {
        plugin_data::truncate(&self.pool).await
    }
}
