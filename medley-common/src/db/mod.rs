//! Destination database access for Medley
//!
//! All services share one SQLite database (`medley.db`) under the resolved
//! root folder. History tables are created here on startup if missing.

pub mod download_history;
pub mod models;
pub mod plugin_data;
pub mod settings;
pub mod transfer_history;

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize the destination database connection pool
///
/// Opens (or creates) the shared database file and bootstraps the history
/// and settings tables.
pub async fn init_db_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the history and settings tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transfer_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            src TEXT NOT NULL,
            dest TEXT NOT NULL,
            mode TEXT,
            type TEXT,
            category TEXT,
            title TEXT,
            year TEXT,
            tmdbid INTEGER,
            seasons TEXT,
            episodes TEXT,
            image TEXT,
            download_hash TEXT,
            date TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS download_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            path TEXT NOT NULL,
            type TEXT,
            title TEXT,
            year TEXT,
            tmdbid INTEGER,
            seasons TEXT,
            episodes TEXT,
            image TEXT,
            download_hash TEXT,
            torrent_name TEXT,
            torrent_description TEXT,
            torrent_site TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plugin_data (
            plugin_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (plugin_id, key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database tables initialized (transfer_history, download_history, plugin_data, settings)"
    );

    Ok(())
}
