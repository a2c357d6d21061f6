//! Read-only access to the legacy NAStool database
//!
//! The legacy schema is foreign and uncontrolled; each category has its own
//! query with literal-value translation done at the source so raw rows
//! arrive in canonical vocabulary (`link`/`move`/`copy` modes, the anime
//! type label folded into the series label, season/episode designators
//! split apart). Anything the queries cannot read surfaces as
//! `SourceUnavailable` and aborts the run.

use crate::SyncError;
use sqlx::SqlitePool;
use std::path::Path;

/// Raw transfer-history row as read from the legacy schema
///
/// The left join pulls poster image and download hash from the legacy
/// download table, which the transfer table itself lacks; one arbitrary
/// download row per distinct TMDB id supplies them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawTransferRow {
    pub src: Option<String>,
    pub dest: Option<String>,
    pub mode: Option<String>,
    pub media_type: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub tmdbid: Option<i64>,
    pub seasons: Option<String>,
    pub episodes: Option<String>,
    pub image: Option<String>,
    pub download_hash: Option<String>,
    pub date: Option<String>,
}

/// Raw download-history row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawDownloadRow {
    pub save_path: Option<String>,
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub tmdbid: Option<i64>,
    pub seasons: Option<String>,
    pub episodes: Option<String>,
    pub image: Option<String>,
    pub download_hash: Option<String>,
    pub torrent_name: Option<String>,
    pub torrent_description: Option<String>,
    pub torrent_site: Option<String>,
}

/// Raw plugin-history row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawPluginRow {
    pub plugin_id: String,
    pub key: String,
    pub value: Option<String>,
}

const TRANSFER_HISTORY_SQL: &str = r#"
SELECT
    t.SOURCE_PATH || '/' || t.SOURCE_FILENAME AS src,
    t.DEST_PATH || '/' || t.DEST_FILENAME AS dest,
    CASE t.MODE
        WHEN '硬链接' THEN 'link'
        WHEN '移动' THEN 'move'
        WHEN '复制' THEN 'copy'
    END AS mode,
    CASE t.TYPE WHEN '动漫' THEN '电视剧' ELSE t.TYPE END AS media_type,
    t.CATEGORY AS category,
    t.TITLE AS title,
    t.YEAR AS year,
    CAST(t.TMDBID AS INTEGER) AS tmdbid,
    CASE t.SEASON_EPISODE
        WHEN NULL THEN NULL
        ELSE substr(t.SEASON_EPISODE, 1, instr(t.SEASON_EPISODE, ' ') - 1)
    END AS seasons,
    CASE t.SEASON_EPISODE
        WHEN NULL THEN NULL
        ELSE substr(t.SEASON_EPISODE, instr(t.SEASON_EPISODE, ' ') + 1)
    END AS episodes,
    d.POSTER AS image,
    d.DOWNLOAD_ID AS download_hash,
    t.DATE AS date
FROM TRANSFER_HISTORY t
LEFT JOIN (SELECT * FROM DOWNLOAD_HISTORY GROUP BY TMDBID) d
    ON t.TITLE = d.TITLE AND t.TYPE = d.TYPE
"#;

const DOWNLOAD_HISTORY_SQL: &str = r#"
SELECT
    SAVE_PATH AS save_path,
    TYPE AS media_type,
    TITLE AS title,
    YEAR AS year,
    CAST(TMDBID AS INTEGER) AS tmdbid,
    CASE SE
        WHEN NULL THEN NULL
        ELSE substr(SE, 1, instr(SE, ' ') - 1)
    END AS seasons,
    CASE SE
        WHEN NULL THEN NULL
        ELSE substr(SE, instr(SE, ' ') + 1)
    END AS episodes,
    POSTER AS image,
    DOWNLOAD_ID AS download_hash,
    TORRENT AS torrent_name,
    "DESC" AS torrent_description,
    SITE AS torrent_site
FROM DOWNLOAD_HISTORY
WHERE SAVE_PATH IS NOT NULL
"#;

const PLUGIN_HISTORY_SQL: &str = r#"
SELECT
    PLUGIN_ID AS plugin_id,
    "KEY" AS key,
    VALUE AS value
FROM PLUGIN_HISTORY
"#;

/// Handle on the legacy database, scoped to a single sync run
pub struct LegacySource {
    pool: SqlitePool,
}

impl LegacySource {
    /// Open the legacy database read-only
    ///
    /// A missing or unreadable file is fatal for the whole run.
    pub async fn open(db_path: &Path) -> Result<Self, SyncError> {
        if !db_path.exists() {
            return Err(SyncError::SourceUnavailable(format!(
                "database not found: {}",
                db_path.display()
            )));
        }

        // mode=ro + immutable: the legacy database is never written, not
        // even for SQLite-internal bookkeeping
        let db_url = format!("sqlite://{}?mode=ro&immutable=true", db_path.display());
        let pool = SqlitePool::connect(&db_url).await.map_err(|e| {
            SyncError::SourceUnavailable(format!("open {} failed: {}", db_path.display(), e))
        })?;

        Ok(Self { pool })
    }

    /// Read all legacy transfer-history rows
    pub async fn transfer_history(&self) -> Result<Vec<RawTransferRow>, SyncError> {
        let rows = sqlx::query_as::<_, RawTransferRow>(TRANSFER_HISTORY_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                SyncError::SourceUnavailable(format!("transfer history query failed: {e}"))
            })?;

        if rows.is_empty() {
            tracing::info!("legacy source has no transfer history rows");
        } else {
            tracing::info!(rows = rows.len(), "fetched legacy transfer history");
        }
        Ok(rows)
    }

    /// Read all legacy download-history rows that have a save path
    pub async fn download_history(&self) -> Result<Vec<RawDownloadRow>, SyncError> {
        let rows = sqlx::query_as::<_, RawDownloadRow>(DOWNLOAD_HISTORY_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                SyncError::SourceUnavailable(format!("download history query failed: {e}"))
            })?;

        if rows.is_empty() {
            tracing::info!("legacy source has no download history rows");
        } else {
            tracing::info!(rows = rows.len(), "fetched legacy download history");
        }
        Ok(rows)
    }

    /// Read all legacy plugin-history rows
    pub async fn plugin_history(&self) -> Result<Vec<RawPluginRow>, SyncError> {
        let rows = sqlx::query_as::<_, RawPluginRow>(PLUGIN_HISTORY_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                SyncError::SourceUnavailable(format!("plugin history query failed: {e}"))
            })?;

        if rows.is_empty() {
            tracing::info!("legacy source has no plugin history rows");
        } else {
            tracing::info!(rows = rows.len(), "fetched legacy plugin history");
        }
        Ok(rows)
    }

    /// Release the connection; called on every exit path of a run
    pub async fn close(self) {
        self.pool.close().await;
    }
}
