#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Torrent-client-agnostic domain types and the control interface used by the
//! completion reconciler.
//!
//! Layout: `model/` (job, snapshot, tags, content descriptors), `service/`
//! (`TorrentControl`), `error.rs` (`TorrentError`).

pub mod error;
pub mod model;
pub mod service;

pub use error::{TorrentError, TorrentResult};
pub use model::{
    ContentDescriptor, InfoHash, Tag, TorrentCompletionJob, TorrentFile, TorrentInfo,
    TorrentProperties, TorrentSnapshot,
};
pub use service::TorrentControl;
