//! Transfer-history store operations
//!
//! Create-only in normal operation; `truncate` exists for the
//! clear-before-import path of the history sync.

use crate::db::models::TransferRecord;
use crate::Result;
use sqlx::SqlitePool;

/// Append a transfer record
pub async fn append(pool: &SqlitePool, record: &TransferRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO transfer_history
            (src, dest, mode, type, category, title, year, tmdbid,
             seasons, episodes, image, download_hash, date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.src)
    .bind(&record.dest)
    .bind(record.mode.map(|m| m.as_str()))
    .bind(&record.media_type)
    .bind(&record.category)
    .bind(&record.title)
    .bind(&record.year)
    .bind(record.tmdbid)
    .bind(&record.seasons)
    .bind(&record.episodes)
    .bind(&record.image)
    .bind(&record.download_hash)
    .bind(&record.date)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete all transfer records
pub async fn truncate(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM transfer_history")
        .execute(pool)
        .await?;
    Ok(())
}

/// Count stored transfer records
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transfer_history")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
