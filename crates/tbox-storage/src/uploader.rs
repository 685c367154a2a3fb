//! Transfer an artifact, then run independent best-effort cleanup actions.

use std::path::Path;
use std::sync::Arc;

use tbox_config::{CleanupPolicy, StorageSettings};
use tbox_fsops::{remove_directory, remove_file};
use tbox_torrent_core::{InfoHash, TorrentControl};
use tracing::{info, warn};
use url::Url;

use crate::error::{StorageError, StorageResult};
use crate::key::ObjectKey;
use crate::store::ObjectStore;

/// Result of one post-upload action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The action ran and succeeded.
    Done,
    /// The action was disabled or had nothing to act on.
    Skipped,
    /// The action ran and failed; the failure was logged.
    Failed,
}

impl CleanupOutcome {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// What was uploaded and what cleanup did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Destination key.
    pub key: ObjectKey,
    /// Bytes transferred.
    pub bytes: u64,
    /// Public download link when a base URL is configured.
    pub public_url: Option<Url>,
    /// Deletion of the uploaded file.
    pub file_removed: CleanupOutcome,
    /// Deletion of the source directory.
    pub source_removed: CleanupOutcome,
    /// Stopping the torrent.
    pub torrent_stopped: CleanupOutcome,
}

/// One upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    /// Torrent the artifact belongs to.
    pub info_hash: &'a InfoHash,
    /// Artifact to upload.
    pub file: &'a Path,
    /// Directory the artifact was produced from, deleted after upload.
    pub source_dir: Option<&'a Path>,
    /// Resolved category; the configured default applies when `None`.
    pub category: Option<&'a str>,
}

/// Uploads artifacts and cleans up after them.
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    torrents: Arc<dyn TorrentControl>,
    namespace: String,
    default_category: String,
    public_base_url: Option<Url>,
    cleanup: CleanupPolicy,
}

impl Uploader {
    /// Build an uploader.
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        torrents: Arc<dyn TorrentControl>,
        settings: &StorageSettings,
        cleanup: CleanupPolicy,
    ) -> Self {
        Self {
            store,
            torrents,
            namespace: settings.namespace.clone(),
            default_category: settings.default_category.clone(),
            public_base_url: settings.public_base_url.clone(),
            cleanup,
        }
    }

    /// Upload `request.file` and run the enabled cleanup actions.
    ///
    /// Only the transfer decides success; cleanup failures are logged and
    /// reported in the receipt.
    ///
    /// # Errors
    ///
    /// - `StorageError::MissingSource` when the file is absent.
    /// - `StorageError::InvalidKey` when no key can be derived.
    /// - Any transfer error from the store.
    pub async fn upload(&self, request: UploadRequest<'_>) -> StorageResult<UploadReceipt> {
        let bytes = match tokio::fs::metadata(request.file).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                return Err(StorageError::MissingSource {
                    path: request.file.to_path_buf(),
                });
            }
        };
        let key = ObjectKey::derive(
            &self.namespace,
            request.category,
            &self.default_category,
            request.file,
        )?;

        self.store.put(request.file, &key).await?;

        let public_url = self
            .public_base_url
            .as_ref()
            .and_then(|base| key.public_url(base));
        info!(
            info_hash = %request.info_hash,
            key = %key,
            bytes,
            link = public_url.as_ref().map(Url::as_str).unwrap_or_default(),
            "upload complete"
        );

        let file_removed = self.remove_uploaded(request.file);
        let source_removed = self.remove_source(request.source_dir);
        let torrent_stopped = self.stop(request.info_hash).await;

        Ok(UploadReceipt {
            key,
            bytes,
            public_url,
            file_removed,
            source_removed,
            torrent_stopped,
        })
    }

    fn remove_uploaded(&self, file: &Path) -> CleanupOutcome {
        if !self.cleanup.delete_file {
            return CleanupOutcome::Skipped;
        }
        match remove_file(file) {
            Ok(()) => CleanupOutcome::Done,
            Err(err) => {
                warn!(path = %file.display(), error = %err, "failed to delete uploaded file");
                CleanupOutcome::Failed
            }
        }
    }

    fn remove_source(&self, source_dir: Option<&Path>) -> CleanupOutcome {
        let Some(dir) = source_dir.filter(|_| self.cleanup.delete_source_dir) else {
            return CleanupOutcome::Skipped;
        };
        match remove_directory(dir) {
            Ok(()) => CleanupOutcome::Done,
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "failed to delete source directory");
                CleanupOutcome::Failed
            }
        }
    }

    async fn stop(&self, hash: &InfoHash) -> CleanupOutcome {
        if !self.cleanup.stop_torrent {
            return CleanupOutcome::Skipped;
        }
        match self.torrents.stop_torrent(hash).await {
            Ok(()) => CleanupOutcome::Done,
            Err(err) => {
                warn!(info_hash = %hash, error = %err, "failed to stop torrent");
                CleanupOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tbox_torrent_core::{Tag, TorrentError, TorrentInfo, TorrentResult};

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        puts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn put(&self, _local: &Path, key: &ObjectKey) -> StorageResult<()> {
            if self.fail {
                return Err(StorageError::CommandFailed {
                    program: "memory".into(),
                    code: Some(1),
                    stderr: String::new(),
                });
            }
            self.puts.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct StopOnly {
        stops: Mutex<u32>,
        fail: bool,
    }

    #[async_trait]
    impl TorrentControl for StopOnly {
        async fn login(&self) -> TorrentResult<()> {
            Ok(())
        }

        async fn torrent_info(&self, _hash: &InfoHash) -> TorrentResult<Option<TorrentInfo>> {
            Ok(None)
        }

        async fn stop_torrent(&self, _hash: &InfoHash) -> TorrentResult<()> {
            *self.stops.lock().unwrap() += 1;
            if self.fail {
                return Err(TorrentError::Status {
                    operation: "torrents.stop",
                    url: "http://qbit.invalid/".into(),
                    status: 500,
                });
            }
            Ok(())
        }

        async fn add_tag(&self, _hash: &InfoHash, _tag: Tag) -> TorrentResult<()> {
            Ok(())
        }

        async fn remove_all_tags(&self, _hash: &InfoHash) -> TorrentResult<()> {
            Ok(())
        }
    }

    fn settings() -> StorageSettings {
        StorageSettings {
            namespace: "torrentbox".into(),
            public_base_url: Some("https://files.example.com/".parse().unwrap()),
            ..StorageSettings::default()
        }
    }

    fn hash() -> InfoHash {
        InfoHash::parse("0123456789abcdef0123456789abcdef01234567").unwrap()
    }

    #[tokio::test]
    async fn upload_then_cleanup_everything() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let source = temp.path().join("Show");
        fs::create_dir_all(&source)?;
        let archive = temp.path().join("Show.zip");
        fs::write(&archive, b"zipbytes")?;

        let store = Arc::new(MemoryStore::default());
        let torrents = Arc::new(StopOnly::default());
        let uploader = Uploader::new(
            store.clone(),
            torrents.clone(),
            &settings(),
            CleanupPolicy::default(),
        );
        let hash = hash();
        let receipt = uploader
            .upload(UploadRequest {
                info_hash: &hash,
                file: &archive,
                source_dir: Some(&source),
                category: Some("tv"),
            })
            .await?;

        assert_eq!(receipt.key.to_string(), "torrentbox/tv/Show.zip");
        assert_eq!(receipt.bytes, 8);
        assert_eq!(
            receipt.public_url.as_ref().map(Url::as_str),
            Some("https://files.example.com/torrentbox/tv/Show.zip")
        );
        assert_eq!(receipt.file_removed, CleanupOutcome::Done);
        assert_eq!(receipt.source_removed, CleanupOutcome::Done);
        assert_eq!(receipt.torrent_stopped, CleanupOutcome::Done);
        assert!(!archive.exists());
        assert!(!source.exists());
        assert_eq!(store.puts.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn cleanup_failures_do_not_fail_upload() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("movie.mkv");
        fs::write(&file, b"x")?;

        let torrents = Arc::new(StopOnly {
            fail: true,
            ..StopOnly::default()
        });
        let uploader = Uploader::new(
            Arc::new(MemoryStore::default()),
            torrents.clone(),
            &settings(),
            CleanupPolicy::default(),
        );
        let hash = hash();
        let receipt = uploader
            .upload(UploadRequest {
                info_hash: &hash,
                file: &file,
                source_dir: Some(&temp.path().join("vanished")),
                category: None,
            })
            .await?;

        assert_eq!(receipt.key.category(), "default");
        assert_eq!(receipt.file_removed, CleanupOutcome::Done);
        assert_eq!(receipt.source_removed, CleanupOutcome::Failed);
        assert_eq!(receipt.torrent_stopped, CleanupOutcome::Failed);
        assert_eq!(*torrents.stops.lock().unwrap(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn disabled_cleanup_is_skipped() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("movie.mkv");
        fs::write(&file, b"x")?;

        let torrents = Arc::new(StopOnly::default());
        let policy = CleanupPolicy {
            delete_file: false,
            delete_source_dir: false,
            stop_torrent: false,
        };
        let uploader = Uploader::new(
            Arc::new(MemoryStore::default()),
            torrents.clone(),
            &settings(),
            policy,
        );
        let hash = hash();
        let receipt = uploader
            .upload(UploadRequest {
                info_hash: &hash,
                file: &file,
                source_dir: Some(temp.path()),
                category: None,
            })
            .await?;

        assert_eq!(receipt.file_removed, CleanupOutcome::Skipped);
        assert_eq!(receipt.source_removed, CleanupOutcome::Skipped);
        assert_eq!(receipt.torrent_stopped, CleanupOutcome::Skipped);
        assert!(file.exists());
        assert_eq!(*torrents.stops.lock().unwrap(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_rejected_before_transfer() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = Arc::new(MemoryStore::default());
        let uploader = Uploader::new(
            store.clone(),
            Arc::new(StopOnly::default()),
            &settings(),
            CleanupPolicy::default(),
        );
        let hash = hash();
        let err = uploader
            .upload(UploadRequest {
                info_hash: &hash,
                file: &temp.path().join("absent.zip"),
                source_dir: None,
                category: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::MissingSource { .. }));
        assert!(store.puts.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn transfer_failure_skips_cleanup() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("movie.mkv");
        fs::write(&file, b"x")?;
        let torrents = Arc::new(StopOnly::default());
        let uploader = Uploader::new(
            Arc::new(MemoryStore {
                fail: true,
                ..MemoryStore::default()
            }),
            torrents.clone(),
            &settings(),
            CleanupPolicy::default(),
        );
        let hash = hash();
        let result = uploader
            .upload(UploadRequest {
                info_hash: &hash,
                file: &file,
                source_dir: None,
                category: None,
            })
            .await;

        assert!(result.is_err());
        assert!(file.exists());
        assert_eq!(*torrents.stops.lock().unwrap(), 0);
        Ok(())
    }
}
