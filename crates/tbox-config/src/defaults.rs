//! Reference values used when the environment does not override them.
//!
//! # Design
//! - Poll budgets mirror the behaviour the web UI was tuned against
//!   (3 s interval, 600 attempts, roughly 30 minutes).
//! - Keep every tunable in one place so the loader and tests agree.

use std::time::Duration;

/// qBittorrent Web UI address.
pub const QBIT_URL: &str = "http://127.0.0.1:8080";
/// qBittorrent Web UI user.
pub const QBIT_USERNAME: &str = "admin";
/// Zip service address.
pub const ZIP_URL: &str = "http://127.0.0.1:8090";
/// Per-request HTTP timeout.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between `check-progress` polls.
pub const ZIP_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Maximum number of poll iterations before giving up.
pub const ZIP_MAX_ATTEMPTS: u32 = 600;
/// Maximum number of failed zip-service calls tolerated.
pub const ZIP_MAX_ERRORS: u32 = 10;
/// Consecutive unchanged size checks that mark an archive as written.
pub const ZIP_SIZE_STABLE_CHECKS: u32 = 10;
/// Consecutive unchanged progress reports that mark progress as stalled.
pub const ZIP_PROGRESS_STALL_CHECKS: u32 = 5;
/// Progress percentage above which a stalled report is trusted.
pub const ZIP_STALL_MIN_PROGRESS: f64 = 80.0;
/// Minimum archive size for the stalled-progress rule.
pub const ZIP_STALL_MIN_SIZE_BYTES: u64 = 1024 * 1024;
/// Size stability required alongside stalled progress.
pub const ZIP_STALL_SIZE_STABLE_CHECKS: u32 = 3;

/// rclone binary looked up on `PATH`.
pub const RCLONE_PATH: &str = "rclone";
/// rclone remote that fronts the S3-compatible bucket.
pub const STORAGE_REMOTE: &str = "s3";
/// Bucket namespace prefix for every object key.
pub const STORAGE_NAMESPACE: &str = "torrentbox";
/// Category segment used when a torrent has none.
pub const DEFAULT_CATEGORY: &str = "default";
/// Transfer attempts before an upload is reported as failed.
pub const UPLOAD_RETRIES: u32 = 3;

/// Delay before the process exits once a terminal tag is published.
pub const EXIT_DELAY: Duration = Duration::from_secs(10);
/// Log level when neither `RUST_LOG` nor `TBOX_LOG_LEVEL` is set.
pub const LOG_LEVEL: &str = "info";
