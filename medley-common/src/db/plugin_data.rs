//! Plugin-data store operations
//!
//! Keyed on `(plugin_id, key)`. Writes are upserts: the same external key
//! may recur across repeated imports and must overwrite in place.

use crate::Result;
use sqlx::SqlitePool;

/// Insert or overwrite a plugin data entry
pub async fn upsert(pool: &SqlitePool, plugin_id: &str, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO plugin_data (plugin_id, key, value) VALUES (?, ?, ?)
        ON CONFLICT(plugin_id, key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(plugin_id)
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a plugin data value
pub async fn get(pool: &SqlitePool, plugin_id: &str, key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT value FROM plugin_data WHERE plugin_id = ? AND key = ?")
            .bind(plugin_id)
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(value,)| value))
}

/// Delete all plugin data entries
pub async fn truncate(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM plugin_data").execute(pool).await?;
    Ok(())
}

/// Count stored plugin data entries
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plugin_data")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
