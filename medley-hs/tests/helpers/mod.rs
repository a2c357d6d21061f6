//! Shared fixtures for medley-hs integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use medley_common::db::models::{DownloadRecord, TransferRecord};
use medley_common::Result;
use medley_hs::stores::{DownloadStore, PluginDataStore, TransferStore};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// A NAStool-shaped legacy database under a temporary directory
///
/// Built writable, then closed via `into_path` before the sync opens it
/// read-only.
pub struct LegacyFixture {
    dir: TempDir,
    pub path: PathBuf,
    pool: SqlitePool,
}

impl LegacyFixture {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&url).await.unwrap();

        for sql in [
            r#"CREATE TABLE TRANSFER_HISTORY (
                ID INTEGER PRIMARY KEY,
                SOURCE_PATH TEXT, SOURCE_FILENAME TEXT,
                DEST_PATH TEXT, DEST_FILENAME TEXT,
                MODE TEXT, TYPE TEXT, CATEGORY TEXT,
                TITLE TEXT, YEAR TEXT, TMDBID INTEGER,
                SEASON_EPISODE TEXT, DATE TEXT
            )"#,
            r#"CREATE TABLE DOWNLOAD_HISTORY (
                ID INTEGER PRIMARY KEY,
                SAVE_PATH TEXT, TYPE TEXT, TITLE TEXT, YEAR TEXT,
                TMDBID INTEGER, SE TEXT, POSTER TEXT, DOWNLOAD_ID TEXT,
                TORRENT TEXT, "DESC" TEXT, SITE TEXT
            )"#,
            r#"CREATE TABLE PLUGIN_HISTORY (
                ID INTEGER PRIMARY KEY,
                PLUGIN_ID TEXT, "KEY" TEXT, VALUE TEXT
            )"#,
        ] {
            sqlx::query(sql).execute(&pool).await.unwrap();
        }

        Self { dir, path, pool }
    }

    /// Insert a transfer row; `dest` of None leaves the destination columns NULL
    pub async fn insert_transfer(
        &self,
        src: (&str, &str),
        dest: Option<(&str, &str)>,
        mode: &str,
        media_type: &str,
        title: &str,
    ) {
        sqlx::query(
            r#"INSERT INTO TRANSFER_HISTORY
               (SOURCE_PATH, SOURCE_FILENAME, DEST_PATH, DEST_FILENAME, MODE,
                TYPE, CATEGORY, TITLE, YEAR, TMDBID, SEASON_EPISODE, DATE)
               VALUES (?, ?, ?, ?, ?, ?, '电影', ?, '2020', 100, NULL, '2023-01-01 00:00:00')"#,
        )
        .bind(src.0)
        .bind(src.1)
        .bind(dest.map(|d| d.0))
        .bind(dest.map(|d| d.1))
        .bind(mode)
        .bind(media_type)
        .bind(title)
        .execute(&self.pool)
        .await
        .unwrap();
    }

    pub async fn insert_download(&self, save_path: &str, title: &str, site: &str) {
        sqlx::query(
            r#"INSERT INTO DOWNLOAD_HISTORY
               (SAVE_PATH, TYPE, TITLE, YEAR, TMDBID, SE, POSTER, DOWNLOAD_ID,
                TORRENT, "DESC", SITE)
               VALUES (?, '电影', ?, '2021', 200, NULL, NULL, 'hash01', ?, 'desc', ?)"#,
        )
        .bind(save_path)
        .bind(title)
        .bind(format!("{title}.1080p"))
        .bind(site)
        .execute(&self.pool)
        .await
        .unwrap();
    }

    pub async fn insert_plugin(&self, plugin_id: &str, key: &str, value: &str) {
        sqlx::query(r#"INSERT INTO PLUGIN_HISTORY (PLUGIN_ID, "KEY", VALUE) VALUES (?, ?, ?)"#)
            .bind(plugin_id)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    /// Close the writer connection and hand over the file for read-only use
    ///
    /// The returned TempDir must stay alive for the duration of the test.
    pub async fn into_path(self) -> (TempDir, PathBuf) {
        self.pool.close().await;
        (self.dir, self.path)
    }
}

/// Create a temporary destination database with the full Medley schema
pub async fn dest_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("medley.db");
    let pool = medley_common::db::init_db_pool(&db_path).await.unwrap();
    (dir, pool)
}

/// Operations observed by a recording store, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Truncate,
    Append(String),
    Upsert(String),
}

/// Transfer store that records every call instead of persisting
#[derive(Default)]
pub struct RecordingTransferStore {
    pub ops: Mutex<Vec<StoreOp>>,
}

#[async_trait]
impl TransferStore for RecordingTransferStore {
    async fn append(&self, record: &TransferRecord) -> Result<()> {
        self.ops
            .lock()
            .unwrap()
            .push(StoreOp::Append(record.dest.clone()));
        Ok(())
    }

    async fn truncate(&self) -> Result<()> {
        self.ops.lock().unwrap().push(StoreOp::Truncate);
        Ok(())
    }
}

/// Download store that records every call instead of persisting
#[derive(Default)]
pub struct RecordingDownloadStore {
    pub ops: Mutex<Vec<StoreOp>>,
}

#[async_trait]
impl DownloadStore for RecordingDownloadStore {
    async fn append(&self, record: &DownloadRecord) -> Result<()> {
        self.ops
            .lock()
            .unwrap()
            .push(StoreOp::Append(record.path.clone()));
        Ok(())
    }

    async fn truncate(&self) -> Result<()> {
        self.ops.lock().unwrap().push(StoreOp::Truncate);
        Ok(())
    }
}

/// Plugin store that records every call instead of persisting
#[derive(Default)]
pub struct RecordingPluginStore {
    pub ops: Mutex<Vec<StoreOp>>,
}

#[async_trait]
impl PluginDataStore for RecordingPluginStore {
    async fn upsert(&self, _plugin_id: &str, key: &str, _value: &str) -> Result<()> {
        self.ops
            .lock()
            .unwrap()
            .push(StoreOp::Upsert(key.to_string()));
        Ok(())
    }

    async fn truncate(&self) -> Result<()> {
        self.ops.lock().unwrap().push(StoreOp::Truncate);
        Ok(())
    }
}

/// Transfer store whose truncate always fails with a row-level error
pub struct BrokenTruncateStore;

#[async_trait]
impl TransferStore for BrokenTruncateStore {
    async fn append(&self, _record: &TransferRecord) -> Result<()> {
        panic!("append must not be reached after a truncate failure");
    }

    async fn truncate(&self) -> Result<()> {
        Err(medley_common::Error::Internal(
            "truncate rejected".to_string(),
        ))
    }
}

/// Transfer store that accepts `ok_writes` appends, then loses its connection
pub struct DyingTransferStore {
    ok_writes: usize,
    attempts: Mutex<usize>,
}

impl DyingTransferStore {
    pub fn new(ok_writes: usize) -> Self {
        Self {
            ok_writes,
            attempts: Mutex::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl TransferStore for DyingTransferStore {
    async fn append(&self, _record: &TransferRecord) -> Result<()> {
        let mut attempts = self.attempts.lock().unwrap();
        *attempts += 1;
        if *attempts <= self.ok_writes {
            Ok(())
        } else {
            Err(medley_common::Error::Database(sqlx::Error::PoolClosed))
        }
    }

    async fn truncate(&self) -> Result<()> {
        Ok(())
    }
}
