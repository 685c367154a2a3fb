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

//! qBittorrent Web API v2 adapter implementing [`TorrentControl`].
//!
//! Layout: `client.rs` (session-holding HTTP client), `wire.rs` (response
//! payloads and their conversion into domain types).
//!
//! [`TorrentControl`]: tbox_torrent_core::TorrentControl

pub mod client;
pub mod wire;

pub use client::QbitClient;
