//! Object storage seam and the rclone-backed implementation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tbox_config::StorageSettings;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{StorageError, StorageResult};
use crate::key::ObjectKey;

const STDERR_TAIL: usize = 2048;

/// Destination for uploaded artifacts.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy `local` to `key`, replacing any existing object.
    async fn put(&self, local: &Path, key: &ObjectKey) -> StorageResult<()>;
}

/// Uploads through `rclone copyto`, retrying with exponential backoff.
#[derive(Debug, Clone)]
pub struct RcloneStore {
    program: String,
    config: Option<PathBuf>,
    remote: String,
    extra_args: Vec<String>,
    max_retries: u32,
    backoff: Duration,
}

impl RcloneStore {
    /// Build a store from storage settings.
    #[must_use]
    pub fn new(settings: &StorageSettings) -> Self {
        Self {
            program: settings.rclone_path.clone(),
            config: settings.rclone_config.clone(),
            remote: settings.remote.clone(),
            extra_args: settings.extra_args.clone(),
            max_retries: settings.max_retries.max(1),
            backoff: Duration::from_secs(1),
        }
    }

    /// Override the backoff unit; the delay before retry `n` is `unit * 2^n`.
    #[must_use]
    pub const fn with_backoff(mut self, unit: Duration) -> Self {
        self.backoff = unit;
        self
    }

    /// `<remote>:<key>` destination string.
    #[must_use]
    pub fn destination(&self, key: &ObjectKey) -> String {
        format!("{}:{key}", self.remote)
    }

    fn command(&self, local: &Path, destination: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(config) = &self.config {
            cmd.arg("--config").arg(config);
        }
        cmd.args(["--log-level", "ERROR", "copyto"])
            .arg(local)
            .arg(destination)
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn attempt(&self, local: &Path, destination: &str) -> StorageResult<()> {
        let output = self
            .command(local, destination)
            .output()
            .await
            .map_err(|source| StorageError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(StorageError::CommandFailed {
            program: self.program.clone(),
            code: output.status.code(),
            stderr: tail(&stderr, STDERR_TAIL).trim().to_string(),
        })
    }
}

/// Last `max_chars` characters of `text`.
fn tail(text: &str, max_chars: usize) -> &str {
    let start = max_chars
        .checked_sub(1)
        .and_then(|skip| text.char_indices().rev().nth(skip))
        .map_or_else(
            || if max_chars == 0 { text.len() } else { 0 },
            |(index, _)| index,
        );
    &text[start..]
}

#[async_trait]
impl ObjectStore for RcloneStore {
    async fn put(&self, local: &Path, key: &ObjectKey) -> StorageResult<()> {
        let destination = self.destination(key);
        info!(
            source = %local.display(),
            destination = %destination,
            "uploading artifact"
        );

        let mut last_error = None;
        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = self.backoff.saturating_mul(2_u32.saturating_pow(attempt));
                info!(attempt = attempt + 1, delay_secs = delay.as_secs_f64(), "retrying upload");
                sleep(delay).await;
            }
            match self.attempt(local, &destination).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(attempt = attempt + 1, error = %err, "upload attempt failed");
                    last_error = Some(err);
                }
            }
        }

        Err(StorageError::RetriesExhausted {
            attempts: self.max_retries,
            last: Box::new(last_error.unwrap_or(StorageError::CommandFailed {
                program: self.program.clone(),
                code: None,
                stderr: String::new(),
            })),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn store(program: &str, retries: u32) -> RcloneStore {
        let settings = StorageSettings {
            rclone_path: program.to_string(),
            remote: "s3".to_string(),
            max_retries: retries,
            ..StorageSettings::default()
        };
        RcloneStore::new(&settings).with_backoff(Duration::ZERO)
    }

    fn key() -> anyhow::Result<ObjectKey> {
        Ok(ObjectKey::derive("ns", Some("tv"), "default", Path::new("/d/Show.zip"))?)
    }

    #[tokio::test]
    async fn successful_program_uploads() -> anyhow::Result<()> {
        store("true", 3).put(Path::new("/d/Show.zip"), &key()?).await?;
        Ok(())
    }

    #[tokio::test]
    async fn failing_program_exhausts_retries() -> anyhow::Result<()> {
        let err = store("false", 2)
            .put(Path::new("/d/Show.zip"), &key()?)
            .await
            .unwrap_err();
        match err {
            StorageError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, StorageError::CommandFailed { code: Some(1), .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn missing_program_reports_spawn_failure() -> anyhow::Result<()> {
        let err = store("/nonexistent/rclone", 1)
            .put(Path::new("/d/Show.zip"), &key()?)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::RetriesExhausted { ref last, .. }
                if matches!(**last, StorageError::Spawn { .. })
        ));
        Ok(())
    }

    #[test]
    fn tail_keeps_exactly_the_last_characters() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("abc", 3), "abc");
        assert_eq!(tail("ab", 3), "ab");
        assert_eq!(tail("héllo", 4), "éllo");
        assert_eq!(tail("abc", 0), "");
        assert_eq!(tail(&"x".repeat(STDERR_TAIL + 10), STDERR_TAIL).len(), STDERR_TAIL);
    }

    #[test]
    fn destination_joins_remote_and_key() -> anyhow::Result<()> {
        assert_eq!(store("rclone", 1).destination(&key()?), "s3:ns/tv/Show.zip");
        Ok(())
    }
}
