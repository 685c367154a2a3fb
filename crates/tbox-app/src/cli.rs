//! Command-line surface of the completion hook.
//!
//! qBittorrent invokes the binary with positional arguments
//! `(torrent name, info-hash, save path, root path, category)`; any of them
//! may be empty.

use std::time::Duration;

use clap::Parser;
use tbox_config::ReconcileConfig;
use tbox_torrent_core::{TorrentCompletionJob, TorrentResult};

/// Arguments passed by the torrent client's "run on completion" hook.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "tbox-reconcile",
    version,
    about = "Archive, upload and tag a completed torrent"
)]
pub struct Cli {
    /// Torrent display name (`%N`).
    #[arg(allow_hyphen_values = true)]
    pub torrent_name: Option<String>,
    /// Torrent info-hash (`%I`).
    #[arg(allow_hyphen_values = true)]
    pub info_hash: Option<String>,
    /// Save path (`%D`).
    #[arg(allow_hyphen_values = true)]
    pub save_path: Option<String>,
    /// Root path (`%R`).
    #[arg(allow_hyphen_values = true)]
    pub root_path: Option<String>,
    /// Category (`%L`).
    #[arg(allow_hyphen_values = true)]
    pub category: Option<String>,
    /// Seconds to wait before the process exits.
    #[arg(long, env = "TBOX_EXIT_DELAY_SECS")]
    pub exit_delay_secs: Option<u64>,
    /// Log output format (`json` or `pretty`).
    #[arg(long, env = "TBOX_LOG_FORMAT")]
    pub log_format: Option<String>,
}

impl Cli {
    /// Convert the positional arguments into a completion job.
    ///
    /// # Errors
    ///
    /// Returns `TorrentError::InvalidJob` when the info-hash is missing or blank.
    pub fn job(&self) -> TorrentResult<TorrentCompletionJob> {
        TorrentCompletionJob::from_args(
            self.torrent_name.as_deref(),
            self.info_hash.as_deref(),
            self.save_path.as_deref(),
            self.root_path.as_deref(),
            self.category.as_deref(),
        )
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut ReconcileConfig) {
        if let Some(secs) = self.exit_delay_secs {
            config.exit_delay = Duration::from_secs(secs);
        }
        if let Some(format) = self
            .log_format
            .as_deref()
            .map(str::trim)
            .filter(|format| !format.is_empty())
        {
            config.telemetry.log_format = Some(format.to_ascii_lowercase());
        }
    }
}
