//! Environment-backed configuration loading.
//!
//! # Design
//! - Every value has a default; the environment only overrides.
//! - The lookup is injected so tests never touch the process environment.

use std::path::PathBuf;

use crate::defaults;
use crate::error::ConfigResult;
use crate::model::{
    CleanupPolicy, QbitSettings, ReconcileConfig, StorageSettings, TelemetrySettings,
    ZipPollPolicy, ZipSettings,
};
use crate::validate::{
    parse_flag, parse_http_url, parse_key_segment, parse_millis, parse_non_empty,
    parse_positive_u32, parse_secs,
};

/// qBittorrent Web UI address.
pub const ENV_QBIT_URL: &str = "TBOX_QBIT_URL";
/// qBittorrent Web UI user.
pub const ENV_QBIT_USERNAME: &str = "TBOX_QBIT_USERNAME";
/// qBittorrent Web UI password.
pub const ENV_QBIT_PASSWORD: &str = "TBOX_QBIT_PASSWORD";
/// Per-request HTTP timeout in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "TBOX_HTTP_TIMEOUT_SECS";
/// Zip service address.
pub const ENV_ZIP_URL: &str = "TBOX_ZIP_URL";
/// Poll interval in milliseconds.
pub const ENV_ZIP_POLL_INTERVAL_MS: &str = "TBOX_ZIP_POLL_INTERVAL_MS";
/// Poll attempt budget.
pub const ENV_ZIP_MAX_ATTEMPTS: &str = "TBOX_ZIP_MAX_ATTEMPTS";
/// Zip-service error budget.
pub const ENV_ZIP_MAX_ERRORS: &str = "TBOX_ZIP_MAX_ERRORS";
/// Size-stability threshold.
pub const ENV_ZIP_STABLE_CHECKS: &str = "TBOX_ZIP_STABLE_CHECKS";
/// rclone binary.
pub const ENV_RCLONE_PATH: &str = "TBOX_RCLONE_PATH";
/// rclone config file.
pub const ENV_RCLONE_CONFIG: &str = "TBOX_RCLONE_CONFIG";
/// Whitespace-separated extra rclone arguments.
pub const ENV_RCLONE_ARGS: &str = "TBOX_RCLONE_ARGS";
/// rclone remote name.
pub const ENV_STORAGE_REMOTE: &str = "TBOX_STORAGE_REMOTE";
/// Bucket namespace.
pub const ENV_STORAGE_NAMESPACE: &str = "TBOX_STORAGE_NAMESPACE";
/// Category used when a torrent has none.
pub const ENV_DEFAULT_CATEGORY: &str = "TBOX_DEFAULT_CATEGORY";
/// Public base URL for download links.
pub const ENV_PUBLIC_BASE_URL: &str = "TBOX_PUBLIC_BASE_URL";
/// Upload attempts.
pub const ENV_UPLOAD_RETRIES: &str = "TBOX_UPLOAD_RETRIES";
/// Delete the uploaded file after transfer.
pub const ENV_DELETE_FILE: &str = "TBOX_DELETE_FILE";
/// Delete the source directory after transfer.
pub const ENV_DELETE_SOURCE_DIR: &str = "TBOX_DELETE_SOURCE_DIR";
/// Stop the torrent after transfer.
pub const ENV_STOP_TORRENT: &str = "TBOX_STOP_TORRENT";
/// Delay before the process exits.
pub const ENV_EXIT_DELAY_SECS: &str = "TBOX_EXIT_DELAY_SECS";
/// Log format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "TBOX_LOG_FORMAT";
/// Log level fallback.
pub const ENV_LOG_LEVEL: &str = "TBOX_LOG_LEVEL";

impl ReconcileConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when any variable is present but invalid.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary key/value lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error when any value is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let timeout = get(ENV_HTTP_TIMEOUT_SECS)
            .map(|raw| parse_secs(ENV_HTTP_TIMEOUT_SECS, &raw))
            .transpose()?
            .unwrap_or(defaults::HTTP_TIMEOUT);

        let qbit = QbitSettings {
            base_url: parse_http_url(
                ENV_QBIT_URL,
                get(ENV_QBIT_URL).as_deref().unwrap_or(defaults::QBIT_URL),
            )?,
            username: get(ENV_QBIT_USERNAME).unwrap_or_else(|| defaults::QBIT_USERNAME.into()),
            password: lookup(ENV_QBIT_PASSWORD).unwrap_or_default(),
            timeout,
        };

        let mut poll = ZipPollPolicy::default();
        if let Some(raw) = get(ENV_ZIP_POLL_INTERVAL_MS) {
            poll.interval = parse_millis(ENV_ZIP_POLL_INTERVAL_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_ZIP_MAX_ATTEMPTS) {
            poll.max_attempts = parse_positive_u32(ENV_ZIP_MAX_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = get(ENV_ZIP_MAX_ERRORS) {
            poll.max_errors = parse_positive_u32(ENV_ZIP_MAX_ERRORS, &raw)?;
        }
        if let Some(raw) = get(ENV_ZIP_STABLE_CHECKS) {
            poll.size_stable_checks = parse_positive_u32(ENV_ZIP_STABLE_CHECKS, &raw)?;
        }

        let zip = ZipSettings {
            base_url: parse_http_url(
                ENV_ZIP_URL,
                get(ENV_ZIP_URL).as_deref().unwrap_or(defaults::ZIP_URL),
            )?,
            timeout,
            poll,
        };

        let mut storage = StorageSettings::default();
        if let Some(raw) = get(ENV_RCLONE_PATH) {
            storage.rclone_path = parse_non_empty(ENV_RCLONE_PATH, &raw)?;
        }
        storage.rclone_config = get(ENV_RCLONE_CONFIG).map(PathBuf::from);
        if let Some(raw) = get(ENV_RCLONE_ARGS) {
            storage.extra_args = raw.split_whitespace().map(str::to_string).collect();
        }
        if let Some(raw) = get(ENV_STORAGE_REMOTE) {
            storage.remote = parse_non_empty(ENV_STORAGE_REMOTE, &raw)?
                .trim_end_matches(':')
                .to_string();
        }
        if let Some(raw) = get(ENV_STORAGE_NAMESPACE) {
            storage.namespace = parse_key_segment(ENV_STORAGE_NAMESPACE, &raw)?;
        }
        if let Some(raw) = get(ENV_DEFAULT_CATEGORY) {
            storage.default_category = parse_key_segment(ENV_DEFAULT_CATEGORY, &raw)?;
        }
        storage.public_base_url = get(ENV_PUBLIC_BASE_URL)
            .map(|raw| parse_http_url(ENV_PUBLIC_BASE_URL, &raw))
            .transpose()?;
        if let Some(raw) = get(ENV_UPLOAD_RETRIES) {
            storage.max_retries = parse_positive_u32(ENV_UPLOAD_RETRIES, &raw)?;
        }

        let mut cleanup = CleanupPolicy::default();
        if let Some(raw) = get(ENV_DELETE_FILE) {
            cleanup.delete_file = parse_flag(ENV_DELETE_FILE, &raw)?;
        }
        if let Some(raw) = get(ENV_DELETE_SOURCE_DIR) {
            cleanup.delete_source_dir = parse_flag(ENV_DELETE_SOURCE_DIR, &raw)?;
        }
        if let Some(raw) = get(ENV_STOP_TORRENT) {
            cleanup.stop_torrent = parse_flag(ENV_STOP_TORRENT, &raw)?;
        }

        let telemetry = TelemetrySettings {
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| defaults::LOG_LEVEL.into()),
            log_format: get(ENV_LOG_FORMAT).map(|raw| raw.trim().to_ascii_lowercase()),
        };

        let exit_delay = get(ENV_EXIT_DELAY_SECS)
            .map(|raw| parse_secs(ENV_EXIT_DELAY_SECS, &raw))
            .transpose()?
            .unwrap_or(defaults::EXIT_DELAY);

        Ok(Self {
            qbit,
            zip,
            storage,
            cleanup,
            telemetry,
            exit_delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::error::ConfigError;

    fn load(pairs: &[(&str, &str)]) -> ConfigResult<ReconcileConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        ReconcileConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() -> anyhow::Result<()> {
        let config = load(&[])?;
        assert_eq!(config.qbit.base_url.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(config.qbit.username, "admin");
        assert_eq!(config.zip.poll, ZipPollPolicy::default());
        assert_eq!(config.zip.poll.interval, Duration::from_secs(3));
        assert_eq!(config.zip.poll.max_attempts, 600);
        assert_eq!(config.storage.namespace, "torrentbox");
        assert_eq!(config.storage.default_category, "default");
        assert_eq!(config.cleanup, CleanupPolicy::default());
        assert_eq!(config.exit_delay, Duration::from_secs(10));
        assert!(config.telemetry.log_format.is_none());
        Ok(())
    }

    #[test]
    fn overrides_are_parsed() -> anyhow::Result<()> {
        let config = load(&[
            (ENV_QBIT_URL, "https://qb.example:8443"),
            (ENV_QBIT_PASSWORD, "hunter2"),
            (ENV_ZIP_POLL_INTERVAL_MS, "50"),
            (ENV_ZIP_MAX_ATTEMPTS, "12"),
            (ENV_ZIP_STABLE_CHECKS, "4"),
            (ENV_STORAGE_REMOTE, "wasabi:"),
            (ENV_STORAGE_NAMESPACE, "/downloads/"),
            (ENV_PUBLIC_BASE_URL, "https://cdn.example"),
            (ENV_RCLONE_ARGS, "--s3-no-check-bucket  --fast-list"),
            (ENV_DELETE_SOURCE_DIR, "no"),
            (ENV_EXIT_DELAY_SECS, "0"),
            (ENV_LOG_FORMAT, "JSON"),
        ])?;
        assert_eq!(config.qbit.base_url.host_str(), Some("qb.example"));
        assert_eq!(config.qbit.password, "hunter2");
        assert_eq!(config.zip.poll.interval, Duration::from_millis(50));
        assert_eq!(config.zip.poll.max_attempts, 12);
        assert_eq!(config.zip.poll.degraded_stable_checks(), 2);
        assert_eq!(config.storage.remote, "wasabi");
        assert_eq!(config.storage.namespace, "downloads");
        assert_eq!(
            config.storage.extra_args,
            vec!["--s3-no-check-bucket".to_string(), "--fast-list".to_string()]
        );
        assert!(config.storage.public_base_url.is_some());
        assert!(!config.cleanup.delete_source_dir);
        assert!(config.cleanup.delete_file);
        assert_eq!(config.exit_delay, Duration::ZERO);
        assert_eq!(config.telemetry.log_format.as_deref(), Some("json"));
        Ok(())
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = load(&[(ENV_ZIP_MAX_ATTEMPTS, "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: ENV_ZIP_MAX_ATTEMPTS,
                reason: "zero",
                ..
            }
        ));

        let err = load(&[(ENV_STOP_TORRENT, "sometimes")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: ENV_STOP_TORRENT,
                ..
            }
        ));
    }

    #[test]
    fn debug_output_redacts_password() -> anyhow::Result<()> {
        let config = load(&[(ENV_QBIT_PASSWORD, "hunter2")])?;
        let rendered = format!("{:?}", config.qbit);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
        Ok(())
    }
}
