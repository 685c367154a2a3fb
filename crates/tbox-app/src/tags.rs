//! Tag State Publisher.
//!
//! # Design
//! - A torrent carries exactly one status tag: publishing clears every tag,
//!   then adds the new one. The two calls are not atomic.
//! - Publishing is best-effort; failures are logged and reported to the
//!   caller as `false`, never as an error.

use std::sync::Arc;

use tbox_torrent_core::{InfoHash, Tag, TorrentControl};
use tracing::{info, warn};

/// Publishes status tags for a single torrent.
#[derive(Clone)]
pub struct TagPublisher {
    torrents: Arc<dyn TorrentControl>,
    hash: InfoHash,
}

impl TagPublisher {
    /// Publisher for `hash`.
    #[must_use]
    pub fn new(torrents: Arc<dyn TorrentControl>, hash: InfoHash) -> Self {
        Self { torrents, hash }
    }

    /// Torrent this publisher writes to.
    #[must_use]
    pub const fn info_hash(&self) -> &InfoHash {
        &self.hash
    }

    /// Replace the torrent's tags with `tag`. Returns whether both calls succeeded.
    pub async fn publish(&self, tag: Tag) -> bool {
        let cleared = match self.torrents.remove_all_tags(&self.hash).await {
            Ok(()) => true,
            Err(err) => {
                warn!(info_hash = %self.hash, tag = tag.label(), error = %err, "failed to clear tags");
                false
            }
        };
        match self.torrents.add_tag(&self.hash, tag).await {
            Ok(()) => {
                info!(info_hash = %self.hash, tag = tag.label(), "published tag");
                cleared
            }
            Err(err) => {
                warn!(info_hash = %self.hash, tag = tag.label(), error = %err, "failed to publish tag");
                false
            }
        }
    }
}
