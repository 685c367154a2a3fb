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

//! Object storage upload and post-upload cleanup.
//!
//! Layout: `key.rs` (object key derivation and public links), `store.rs`
//! (`ObjectStore` trait with the rclone implementation), `uploader.rs`
//! (transfer plus best-effort cleanup), `error.rs`.

pub mod error;
pub mod key;
pub mod store;
pub mod uploader;

pub use error::{StorageError, StorageResult};
pub use key::ObjectKey;
pub use store::{ObjectStore, RcloneStore};
pub use uploader::{CleanupOutcome, UploadReceipt, UploadRequest, Uploader};
