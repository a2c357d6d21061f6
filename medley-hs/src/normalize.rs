//! Raw legacy rows → canonical Medley records
//!
//! Each category has its own mapping: transfer rows get both paths
//! remapped (or are discarded when either is empty), download rows get the
//! site name translated and the save path reduced to its final component,
//! and plugin rows for the two cross-seed plugins get their embedded
//! downloader index rewritten inside composite keys and JSON values.

use crate::legacy::{RawDownloadRow, RawPluginRow, RawTransferRow};
use crate::remap::{remap_downloader, remap_path, remap_site, RemapRule};
use crate::SyncError;
use medley_common::db::models::{DownloadRecord, PluginRecord, TransferMode, TransferRecord};

/// Cross-seed transfer plugin: composite `"<index>-<hash>"` keys and a
/// `to_download` field in the value
pub const TORRENT_TRANSFER_ID: &str = "TorrentTransfer";

/// Auto cross-seed plugin: value is a JSON array of objects, each with a
/// `downloader` field
pub const AUTO_SEED_ID: &str = "IYUUAutoSeed";

/// Map a raw transfer row, remapping both paths
///
/// Rows whose source or destination path is empty after trimming are
/// discarded rather than written.
pub fn normalize_transfer(raw: RawTransferRow, path_rules: &[RemapRule]) -> Option<TransferRecord> {
    let src = raw.src.as_deref().unwrap_or("").trim().to_string();
    let dest = raw.dest.as_deref().unwrap_or("").trim().to_string();
    if src.is_empty() || dest.is_empty() {
        return None;
    }

    Some(TransferRecord {
        src: remap_path(&src, path_rules),
        dest: remap_path(&dest, path_rules),
        mode: raw.mode.as_deref().and_then(|m| m.parse::<TransferMode>().ok()),
        media_type: raw.media_type,
        category: raw.category,
        title: raw.title,
        year: raw.year,
        tmdbid: raw.tmdbid,
        seasons: raw.seasons,
        episodes: raw.episodes,
        image: raw.image,
        download_hash: raw.download_hash,
        date: raw.date,
    })
}

/// Map a raw download row
///
/// Only the final component of the save path is persisted; the site name
/// goes through the site rule set, unmatched names pass through.
pub fn normalize_download(raw: RawDownloadRow, site_rules: &[RemapRule]) -> DownloadRecord {
    DownloadRecord {
        path: basename(raw.save_path.as_deref().unwrap_or("")),
        media_type: raw.media_type,
        title: raw.title,
        year: raw.year,
        tmdbid: raw.tmdbid,
        seasons: raw.seasons,
        episodes: raw.episodes,
        image: raw.image,
        download_hash: raw.download_hash,
        torrent_name: raw.torrent_name,
        torrent_description: raw.torrent_description,
        torrent_site: raw.torrent_site.map(|s| remap_site(&s, site_rules)),
    }
}

/// Map a raw plugin row
///
/// The two cross-seed plugin ids get their downloader index rewritten;
/// every other id passes through with the raw value text untouched.
/// Rewriting is only attempted when downloader rules exist, so malformed
/// values are an error only when a rewrite would have applied.
pub fn normalize_plugin(
    raw: RawPluginRow,
    downloader_rules: &[RemapRule],
) -> Result<PluginRecord, SyncError> {
    let value = raw.value.unwrap_or_default();

    if downloader_rules.is_empty() {
        return Ok(PluginRecord {
            plugin_id: raw.plugin_id,
            key: raw.key,
            value,
        });
    }

    match raw.plugin_id.as_str() {
        TORRENT_TRANSFER_ID => {
            let key = remap_composite_key(&raw.key, downloader_rules);
            let value = remap_transfer_value(&raw.key, &value, downloader_rules)?;
            Ok(PluginRecord {
                plugin_id: raw.plugin_id,
                key,
                value,
            })
        }
        AUTO_SEED_ID => {
            let value = remap_seed_value(&raw.key, &value, downloader_rules)?;
            Ok(PluginRecord {
                plugin_id: raw.plugin_id,
                key: raw.key,
                value,
            })
        }
        _ => Ok(PluginRecord {
            plugin_id: raw.plugin_id,
            key: raw.key,
            value,
        }),
    }
}

/// Final path component, accepting both separator styles
fn basename(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()
}

/// Rewrite the downloader index at the front of a `"<index>-<hash>"` key
fn remap_composite_key(key: &str, rules: &[RemapRule]) -> String {
    match key.split_once('-') {
        Some((index, hash)) => {
            let mapped = remap_downloader(index, rules);
            if mapped != index {
                format!("{mapped}-{hash}")
            } else {
                key.to_string()
            }
        }
        None => key.to_string(),
    }
}

/// Rewrite the `to_download` field of a cross-seed transfer value
fn remap_transfer_value(key: &str, value: &str, rules: &[RemapRule]) -> Result<String, SyncError> {
    let mut parsed: serde_json::Value =
        serde_json::from_str(value).map_err(|e| SyncError::ValueDecode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(object) = parsed.as_object_mut() {
        if let Some(mapped) = object.get("to_download").and_then(|v| remap_index(v, rules)) {
            object.insert("to_download".to_string(), serde_json::Value::String(mapped));
        }
    }

    Ok(parsed.to_string())
}

/// Rewrite the `downloader` field of each entry in an auto cross-seed value
fn remap_seed_value(key: &str, value: &str, rules: &[RemapRule]) -> Result<String, SyncError> {
    let mut parsed: serde_json::Value =
        serde_json::from_str(value).map_err(|e| SyncError::ValueDecode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

    let Some(entries) = parsed.as_array_mut() else {
        // Well-formed but not a list; foreign shape, stored as-is
        tracing::debug!(key, "auto cross-seed value is not a list; left unchanged");
        return Ok(value.to_string());
    };

    for entry in entries {
        let Some(object) = entry.as_object_mut() else {
            continue;
        };
        if let Some(mapped) = object.get("downloader").and_then(|v| remap_index(v, rules)) {
            object.insert("downloader".to_string(), serde_json::Value::String(mapped));
        }
    }

    Ok(parsed.to_string())
}

/// Numeric comparison of a JSON scalar (number or numeric string) against
/// the rule set; `Some(destination)` on the first match
fn remap_index(value: &serde_json::Value, rules: &[RemapRule]) -> Option<String> {
    let index = match value {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    rules
        .iter()
        .find(|r| r.source.trim().parse::<i64>() == Ok(index))
        .map(|r| r.dest.clone())
}
