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

//! Filesystem side of the completion reconciler: content classification,
//! path probing, and best-effort cleanup.
//!
//! Layout: `probe.rs` (`PathProbe` + `DiskProbe`), `locator.rs` (content
//! locator and archive naming), `cleanup.rs` (removal helpers), `error.rs`.

pub mod cleanup;
pub mod error;
pub mod locator;
pub mod probe;

pub use cleanup::{remove_directory, remove_file};
pub use error::{FsOpsError, FsOpsResult};
pub use locator::{CandidateSource, ContentLocator, archive_path_for};
pub use probe::{DiskProbe, PathKind, PathProbe};
