//! Download-history store operations

use crate::db::models::DownloadRecord;
use crate::Result;
use sqlx::{Row, SqlitePool};

/// Append a download record
pub async fn append(pool: &SqlitePool, record: &DownloadRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO download_history
            (path, type, title, year, tmdbid, seasons, episodes, image,
             download_hash, torrent_name, torrent_description, torrent_site)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.path)
    .bind(&record.media_type)
    .bind(&record.title)
    .bind(&record.year)
    .bind(record.tmdbid)
    .bind(&record.seasons)
    .bind(&record.episodes)
    .bind(&record.image)
    .bind(&record.download_hash)
    .bind(&record.torrent_name)
    .bind(&record.torrent_description)
    .bind(&record.torrent_site)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete all download records
pub async fn truncate(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM download_history")
        .execute(pool)
        .await?;
    Ok(())
}

/// Count stored download records
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM download_history")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Load all download records, oldest first
pub async fn list(pool: &SqlitePool) -> Result<Vec<DownloadRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT path, type, title, year, tmdbid, seasons, episodes, image,
               download_hash, torrent_name, torrent_description, torrent_site
        FROM download_history
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| DownloadRecord {
            path: row.get("path"),
            media_type: row.get("type"),
            title: row.get("title"),
            year: row.get("year"),
            tmdbid: row.get("tmdbid"),
            seasons: row.get("seasons"),
            episodes: row.get("episodes"),
            image: row.get("image"),
            download_hash: row.get("download_hash"),
            torrent_name: row.get("torrent_name"),
            torrent_description: row.get("torrent_description"),
            torrent_site: row.get("torrent_site"),
        })
        .collect())
}
