//! # Design
//!
//! - Centralize errors raised while bootstrapping a reconciler run.
//! - Pipeline failures never surface here; they end as terminal tags.
//! - Keep messages constant while carrying the failing operation as context.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// The hook did not supply a usable torrent job.
    #[error("invalid completion job")]
    InvalidJob {
        /// Source validation error.
        source: tbox_torrent_core::TorrentError,
    },
    /// Configuration loading failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: tbox_config::ConfigError,
    },
    /// Telemetry setup failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: tbox_telemetry::TelemetryError,
    },
    /// Torrent client construction failed.
    #[error("torrent client operation failed")]
    Torrent {
        /// Operation identifier.
        operation: &'static str,
        /// Source torrent error.
        source: tbox_torrent_core::TorrentError,
    },
    /// Zip service construction failed.
    #[error("zip service operation failed")]
    Archive {
        /// Operation identifier.
        operation: &'static str,
        /// Source archive error.
        source: tbox_archive::ArchiveError,
    },
    /// The async runtime could not be started.
    #[error("runtime operation failed")]
    Runtime {
        /// Operation identifier.
        operation: &'static str,
        /// Source I/O error.
        source: std::io::Error,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: tbox_config::ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: tbox_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn torrent(
        operation: &'static str,
        source: tbox_torrent_core::TorrentError,
    ) -> Self {
        Self::Torrent { operation, source }
    }

    pub(crate) const fn archive(
        operation: &'static str,
        source: tbox_archive::ArchiveError,
    ) -> Self {
        Self::Archive { operation, source }
    }

    /// Process exit code for this failure: `1` for a missing info-hash, `2`
    /// for every bootstrap failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidJob { .. } => 1,
            _ => 2,
        }
    }
}
