//! Control interface implemented by torrent client adapters.

use async_trait::async_trait;

use crate::error::TorrentResult;
use crate::model::{InfoHash, Tag, TorrentFile, TorrentInfo, TorrentProperties};

/// Operations the reconciler needs from the torrent client.
#[async_trait]
pub trait TorrentControl: Send + Sync {
    /// Establish a session with the client.
    async fn login(&self) -> TorrentResult<()>;

    /// Look up torrent metadata; `None` when the client does not know the hash.
    async fn torrent_info(&self, hash: &InfoHash) -> TorrentResult<Option<TorrentInfo>>;

    /// Fetch torrent properties; default implementation reports nothing.
    async fn torrent_properties(&self, hash: &InfoHash) -> TorrentResult<Option<TorrentProperties>> {
        let _ = hash;
        Ok(None)
    }

    /// Fetch the torrent's file list; default implementation reports nothing.
    async fn torrent_files(&self, hash: &InfoHash) -> TorrentResult<Vec<TorrentFile>> {
        let _ = hash;
        Ok(Vec::new())
    }

    /// Stop (pause) the torrent so it no longer seeds.
    async fn stop_torrent(&self, hash: &InfoHash) -> TorrentResult<()>;

    /// Attach a tag to the torrent.
    async fn add_tag(&self, hash: &InfoHash, tag: Tag) -> TorrentResult<()>;

    /// Remove every tag from the torrent.
    async fn remove_all_tags(&self, hash: &InfoHash) -> TorrentResult<()>;
}
