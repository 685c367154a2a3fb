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

//! Completion reconciler wiring.
//!
//! Layout: `cli.rs` (hook arguments), `bootstrap.rs` (process setup),
//! `orchestrator.rs` (pipeline state machine), `tags.rs` (status tags).

/// Process bootstrap and the pipeline task.
pub mod bootstrap;
/// Hook argument parsing.
pub mod cli;
/// Application error types.
pub mod error;
/// Pipeline state machine.
pub mod orchestrator;
/// Tag State Publisher.
pub mod tags;

pub use bootstrap::{production_deps, run_app, run_cli, run_job};
pub use cli::Cli;
pub use error::{AppError, AppResult};
pub use orchestrator::{Pipeline, PipelineDeps, PipelineOutcome, PipelineState};
pub use tags::TagPublisher;
