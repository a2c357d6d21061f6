//! Settings database operations
//!
//! Key/value accessors over the `settings` table. Scalar settings use the
//! typed pair; structured settings (plugin configuration blobs) use the
//! JSON pair.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

/// Typed setting getter
pub async fn get_setting<T>(pool: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting {} failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Typed setting setter (upsert)
pub async fn set_setting<T>(pool: &SqlitePool, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

/// Fetch and deserialize a JSON-encoded setting
pub async fn get_json<T: DeserializeOwned>(pool: &SqlitePool, key: &str) -> Result<Option<T>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = serde_json::from_str(&value)
                .map_err(|e| Error::Config(format!("Decode setting {} failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Serialize and store a JSON-encoded setting (upsert, single statement)
pub async fn set_json<T: Serialize>(pool: &SqlitePool, key: &str, value: &T) -> Result<()> {
    let encoded = serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("Encode setting {} failed: {}", key, e)))?;

    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(encoded)
    .execute(pool)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
