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

//! Runtime configuration for the completion reconciler.
//!
//! Layout: `model.rs` (typed settings), `defaults.rs` (reference constants),
//! `loader.rs` (environment loading), `validate.rs` (parsing helpers).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{
    CleanupPolicy, QbitSettings, ReconcileConfig, StorageSettings, TelemetrySettings,
    ZipPollPolicy, ZipSettings,
};
