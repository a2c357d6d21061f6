//! Integration tests for the history store operations
//!
//! Covers the write semantics the history sync relies on:
//! - transfer/download history are create-only (duplicates allowed)
//! - plugin data upserts on (plugin_id, key)
//! - truncate empties each store independently

use medley_common::db::models::{DownloadRecord, TransferMode, TransferRecord};
use medley_common::db::{download_history, plugin_data, transfer_history};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create a temporary destination database with the full schema
async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("medley.db");
    let pool = medley_common::db::init_db_pool(&db_path).await.unwrap();
    (temp_dir, pool)
}

fn sample_transfer(title: &str) -> TransferRecord {
    TransferRecord {
        src: format!("/downloads/{title}.mkv"),
        dest: format!("/library/{title}.mkv"),
        mode: Some(TransferMode::Link),
        media_type: Some("电影".to_string()),
        category: None,
        title: Some(title.to_string()),
        year: Some("2020".to_string()),
        tmdbid: Some(603),
        seasons: None,
        episodes: None,
        image: None,
        download_hash: Some("abc123".to_string()),
        date: Some("2023-01-01 00:00:00".to_string()),
    }
}

fn sample_download(title: &str, site: &str) -> DownloadRecord {
    DownloadRecord {
        path: format!("{title}.mkv"),
        media_type: Some("电影".to_string()),
        title: Some(title.to_string()),
        year: Some("2021".to_string()),
        tmdbid: Some(550),
        seasons: None,
        episodes: None,
        image: None,
        download_hash: Some("def456".to_string()),
        torrent_name: Some(format!("{title}.1080p")),
        torrent_description: None,
        torrent_site: Some(site.to_string()),
    }
}

#[tokio::test]
async fn transfer_append_is_create_only() {
    let (_dir, pool) = create_test_db().await;
    let record = sample_transfer("Inception");

    transfer_history::append(&pool, &record).await.unwrap();
    transfer_history::append(&pool, &record).await.unwrap();

    // Identical records duplicate; the store never dedups
    assert_eq!(transfer_history::count(&pool).await.unwrap(), 2);
}

#[tokio::test]
async fn transfer_truncate_empties_store() {
    let (_dir, pool) = create_test_db().await;

    transfer_history::append(&pool, &sample_transfer("Dune")).await.unwrap();
    transfer_history::append(&pool, &sample_transfer("Arrival")).await.unwrap();
    assert_eq!(transfer_history::count(&pool).await.unwrap(), 2);

    transfer_history::truncate(&pool).await.unwrap();
    assert_eq!(transfer_history::count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn download_append_and_list_roundtrip() {
    let (_dir, pool) = create_test_db().await;

    download_history::append(&pool, &sample_download("Tenet", "SitA")).await.unwrap();
    download_history::append(&pool, &sample_download("Dunkirk", "SitB")).await.unwrap();

    let records = download_history::list(&pool).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, "Tenet.mkv");
    assert_eq!(records[0].torrent_site.as_deref(), Some("SitA"));
    assert_eq!(records[1].torrent_site.as_deref(), Some("SitB"));
}

#[tokio::test]
async fn plugin_upsert_overwrites_on_same_key() {
    let (_dir, pool) = create_test_db().await;

    plugin_data::upsert(&pool, "TorrentTransfer", "1-abc", r#"{"to_download": 1}"#)
        .await
        .unwrap();
    plugin_data::upsert(&pool, "TorrentTransfer", "1-abc", r#"{"to_download": 2}"#)
        .await
        .unwrap();

    assert_eq!(plugin_data::count(&pool).await.unwrap(), 1);

    let value = plugin_data::get(&pool, "TorrentTransfer", "1-abc")
        .await
        .unwrap();
    assert_eq!(value.as_deref(), Some(r#"{"to_download": 2}"#));
}

#[tokio::test]
async fn plugin_entries_are_scoped_by_plugin_id() {
    let (_dir, pool) = create_test_db().await;

    plugin_data::upsert(&pool, "PluginA", "shared-key", "1").await.unwrap();
    plugin_data::upsert(&pool, "PluginB", "shared-key", "2").await.unwrap();

    assert_eq!(plugin_data::count(&pool).await.unwrap(), 2);
    let value = plugin_data::get(&pool, "PluginA", "shared-key").await.unwrap();
    assert_eq!(value.as_deref(), Some("1"));
}

#[tokio::test]
async fn truncate_leaves_other_stores_alone() {
    let (_dir, pool) = create_test_db().await;

    transfer_history::append(&pool, &sample_transfer("Heat")).await.unwrap();
    download_history::append(&pool, &sample_download("Heat", "SitA")).await.unwrap();
    plugin_data::upsert(&pool, "PluginA", "k", "v").await.unwrap();

    download_history::truncate(&pool).await.unwrap();

    assert_eq!(download_history::count(&pool).await.unwrap(), 0);
    assert_eq!(transfer_history::count(&pool).await.unwrap(), 1);
    assert_eq!(plugin_data::count(&pool).await.unwrap(), 1);
}
