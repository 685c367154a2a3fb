//! Response payloads returned by the qBittorrent Web API.
//!
//! qBittorrent reports "not applicable" paths as empty strings; conversion
//! maps those to `None`.

use std::path::PathBuf;

use serde::Deserialize;
use tbox_torrent_core::{TorrentFile, TorrentInfo, TorrentProperties};

/// Entry of `GET /api/v2/torrents/info`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InfoEntry {
    /// Torrent name.
    pub name: String,
    /// Save path.
    pub save_path: String,
    /// Content path (file or top-level directory).
    pub content_path: String,
    /// Root path (empty for torrents without a root folder).
    pub root_path: String,
    /// Category.
    pub category: String,
    /// Comma-separated tag list.
    pub tags: String,
}

impl From<InfoEntry> for TorrentInfo {
    fn from(entry: InfoEntry) -> Self {
        Self {
            name: entry.name,
            save_path: non_empty_path(entry.save_path),
            content_path: non_empty_path(entry.content_path),
            root_path: non_empty_path(entry.root_path),
            category: Some(entry.category).filter(|category| !category.trim().is_empty()),
            tags: entry
                .tags
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Body of `GET /api/v2/torrents/properties`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PropertiesBody {
    /// Save path.
    pub save_path: String,
}

impl From<PropertiesBody> for TorrentProperties {
    fn from(body: PropertiesBody) -> Self {
        Self {
            save_path: non_empty_path(body.save_path),
        }
    }
}

/// Entry of `GET /api/v2/torrents/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    /// File index; missing on older clients.
    #[serde(default)]
    pub index: Option<u32>,
    /// Path relative to the save path.
    pub name: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// Convert a file list, numbering entries by position when the client omits indices.
#[must_use]
pub fn files_from_wire(entries: Vec<FileEntry>) -> Vec<TorrentFile> {
    entries
        .into_iter()
        .zip(0_u32..)
        .map(|(entry, position)| TorrentFile {
            index: entry.index.unwrap_or(position),
            name: entry.name.replace('\\', "/"),
            size: entry.size,
        })
        .collect()
}

fn non_empty_path(raw: String) -> Option<PathBuf> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(raw))
    }
}
