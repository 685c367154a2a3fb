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

//! Remote zip coordination.
//!
//! Layout: `service.rs` (`ZipService` trait and wire types), `http.rs`
//! (reqwest adapter), `convergence.rs` (pure poll-state policy),
//! `coordinator.rs` (poll loop), `error.rs`.

pub mod convergence;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod service;

pub use convergence::{
    ConvergenceReason, FailureReason, Observation, RemoteSignal, Verdict, ZipProgressState,
};
pub use coordinator::{ZipCoordinator, ZipOutcome};
pub use error::{ArchiveError, ArchiveResult};
pub use http::HttpZipService;
pub use service::{ZipReply, ZipRequest, ZipService, ZipStatus};
