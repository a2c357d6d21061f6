//! Canonical history record shapes

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a transferred file reached its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Hard link
    Link,
    /// Moved
    Move,
    /// Copied
    Copy,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMode::Link => "link",
            TransferMode::Move => "move",
            TransferMode::Copy => "copy",
        }
    }
}

impl FromStr for TransferMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link" => Ok(TransferMode::Link),
            "move" => Ok(TransferMode::Move),
            "copy" => Ok(TransferMode::Copy),
            _ => Err(()),
        }
    }
}

/// A completed file-transfer event
///
/// Written create-only: records are never updated, only appended or bulk
/// cleared before an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub src: String,
    pub dest: String,
    pub mode: Option<TransferMode>,
    /// Media type (movie or series), stored as the source's literal label
    pub media_type: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub tmdbid: Option<i64>,
    /// Season designator (`Sxx`)
    pub seasons: Option<String>,
    /// Episode designator (`Exx`)
    pub episodes: Option<String>,
    /// Poster image reference
    pub image: Option<String>,
    pub download_hash: Option<String>,
    pub date: Option<String>,
}

/// A download-task outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    /// Final component of the save path
    pub path: String,
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

/// An opaque plugin-scoped key/value entry
///
/// `value` holds JSON text; the store treats `(plugin_id, key)` as an
/// upsert key, so re-importing the same external key overwrites in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub plugin_id: String,
    pub key: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_mode_roundtrip() {
        for mode in [TransferMode::Link, TransferMode::Move, TransferMode::Copy] {
            assert_eq!(mode.as_str().parse::<TransferMode>(), Ok(mode));
        }
        assert!("hardlink".parse::<TransferMode>().is_err());
    }
}
