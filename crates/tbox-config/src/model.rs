//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers; loading lives in `loader.rs`.
//! - Each component receives only its own section.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::defaults;

/// Complete configuration for one reconciler invocation.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Torrent client connection settings.
    pub qbit: QbitSettings,
    /// Zip service connection and polling settings.
    pub zip: ZipSettings,
    /// Object storage settings.
    pub storage: StorageSettings,
    /// Post-upload cleanup toggles.
    pub cleanup: CleanupPolicy,
    /// Logging settings.
    pub telemetry: TelemetrySettings,
    /// Delay before the process exits after publishing a terminal tag.
    pub exit_delay: Duration,
}

/// qBittorrent Web API connection settings.
#[derive(Clone)]
pub struct QbitSettings {
    /// Base URL of the Web UI, e.g. `http://127.0.0.1:8080`.
    pub base_url: Url,
    /// Web UI user name.
    pub username: String,
    /// Web UI password.
    pub password: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for QbitSettings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("QbitSettings")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Zip service connection settings.
#[derive(Debug, Clone)]
pub struct ZipSettings {
    /// Base URL of the zip service.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Convergence budgets for the poll loop.
    pub poll: ZipPollPolicy,
}

/// Budgets and thresholds that drive zip convergence.
#[derive(Debug, Clone, PartialEq)]
pub struct ZipPollPolicy {
    /// Delay between polls.
    pub interval: Duration,
    /// Maximum number of poll iterations.
    pub max_attempts: u32,
    /// Maximum number of failed zip-service calls.
    pub max_errors: u32,
    /// Consecutive unchanged local size checks treated as "finished writing".
    pub size_stable_checks: u32,
    /// Consecutive unchanged progress reports treated as stalled.
    pub progress_stall_checks: u32,
    /// Progress percentage a stalled report must exceed.
    pub stall_min_progress: f64,
    /// Archive size a stalled report requires, in bytes.
    pub stall_min_size_bytes: u64,
    /// Local size stability required alongside stalled progress.
    pub stall_size_stable_checks: u32,
}

impl ZipPollPolicy {
    /// Size stability required when the zip service is failing.
    #[must_use]
    pub const fn degraded_stable_checks(&self) -> u32 {
        self.size_stable_checks.div_ceil(2)
    }
}

impl Default for ZipPollPolicy {
    fn default() -> Self {
        Self {
            interval: defaults::ZIP_POLL_INTERVAL,
            max_attempts: defaults::ZIP_MAX_ATTEMPTS,
            max_errors: defaults::ZIP_MAX_ERRORS,
            size_stable_checks: defaults::ZIP_SIZE_STABLE_CHECKS,
            progress_stall_checks: defaults::ZIP_PROGRESS_STALL_CHECKS,
            stall_min_progress: defaults::ZIP_STALL_MIN_PROGRESS,
            stall_min_size_bytes: defaults::ZIP_STALL_MIN_SIZE_BYTES,
            stall_size_stable_checks: defaults::ZIP_STALL_SIZE_STABLE_CHECKS,
        }
    }
}

/// Object storage settings for the rclone transfer.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// rclone binary.
    pub rclone_path: String,
    /// Optional rclone config file passed via `--config`.
    pub rclone_config: Option<PathBuf>,
    /// rclone remote name.
    pub remote: String,
    /// Bucket namespace that prefixes every key.
    pub namespace: String,
    /// Category segment used when the torrent has no category.
    pub default_category: String,
    /// Public base URL used to render download links.
    pub public_base_url: Option<Url>,
    /// Transfer attempts before giving up.
    pub max_retries: u32,
    /// Extra arguments appended to every rclone invocation.
    pub extra_args: Vec<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            rclone_path: defaults::RCLONE_PATH.to_string(),
            rclone_config: None,
            remote: defaults::STORAGE_REMOTE.to_string(),
            namespace: defaults::STORAGE_NAMESPACE.to_string(),
            default_category: defaults::DEFAULT_CATEGORY.to_string(),
            public_base_url: None,
            max_retries: defaults::UPLOAD_RETRIES,
            extra_args: Vec::new(),
        }
    }
}

/// Independent, best-effort actions run after a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    /// Delete the uploaded file.
    pub delete_file: bool,
    /// Delete the source directory the file was produced from.
    pub delete_source_dir: bool,
    /// Stop the torrent in the client.
    pub stop_torrent: bool,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            delete_file: true,
            delete_source_dir: true,
            stop_torrent: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySettings {
    /// Fallback level when `RUST_LOG` is unset.
    pub log_level: String,
    /// Requested log format (`json` or `pretty`); inferred when unset.
    pub log_format: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: defaults::LOG_LEVEL.to_string(),
            log_format: None,
        }
    }
}
