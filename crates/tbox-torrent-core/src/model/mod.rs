//! Domain types shared by every stage of the reconciliation pipeline.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TorrentError, TorrentResult};

/// Lowercase hex identifier of a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InfoHash(String);

impl InfoHash {
    /// Normalise a raw hash argument.
    ///
    /// # Errors
    ///
    /// Returns `TorrentError::InvalidJob` when the value is blank.
    pub fn parse(raw: &str) -> TorrentResult<Self> {
        let normalised = raw.trim().to_ascii_lowercase();
        if normalised.is_empty() {
            return Err(TorrentError::InvalidJob {
                field: "info_hash",
                reason: "missing",
            });
        }
        Ok(Self(normalised))
    }

    /// Borrow the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the hash looks like a v1 (40 hex) or v2 (64 hex) info-hash.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        matches!(self.0.len(), 40 | 64) && self.0.bytes().all(|byte| byte.is_ascii_hexdigit())
    }
}

impl Display for InfoHash {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// One reconciliation request, built from the completion hook arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentCompletionJob {
    /// Torrent name as reported by the hook (may be empty).
    pub name: String,
    /// Torrent identifier.
    pub info_hash: InfoHash,
    /// Save path reported by the hook.
    pub save_path: Option<PathBuf>,
    /// Root path reported by the hook.
    pub root_path: Option<PathBuf>,
    /// Category reported by the hook.
    pub category: Option<String>,
}

impl TorrentCompletionJob {
    /// Build a job from positional hook arguments; blank values count as absent.
    ///
    /// # Errors
    ///
    /// Returns `TorrentError::InvalidJob` when the info-hash is missing.
    pub fn from_args(
        name: Option<&str>,
        info_hash: Option<&str>,
        save_path: Option<&str>,
        root_path: Option<&str>,
        category: Option<&str>,
    ) -> TorrentResult<Self> {
        let info_hash = InfoHash::parse(info_hash.unwrap_or_default())?;
        Ok(Self {
            name: name.map(str::trim).unwrap_or_default().to_string(),
            info_hash,
            save_path: non_blank(save_path).map(PathBuf::from),
            root_path: non_blank(root_path).map(PathBuf::from),
            category: non_blank(category).map(str::to_string),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Torrent metadata returned by the client's info endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Display name.
    pub name: String,
    /// Directory the torrent saves into.
    pub save_path: Option<PathBuf>,
    /// Absolute path of the torrent content (file or top directory).
    pub content_path: Option<PathBuf>,
    /// Absolute path of the torrent root directory, if any.
    pub root_path: Option<PathBuf>,
    /// Category assigned in the client.
    pub category: Option<String>,
    /// Tags currently assigned.
    pub tags: Vec<String>,
}

/// Subset of the client's torrent properties the reconciler needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentProperties {
    /// Directory the torrent saves into.
    pub save_path: Option<PathBuf>,
}

/// One entry of a torrent's file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentFile {
    /// Index within the torrent.
    pub index: u32,
    /// Path relative to the save path, `/`-separated.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// Everything the content locator knows about a torrent.
///
/// Caller-supplied values win over client-reported ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentSnapshot {
    /// Torrent name.
    pub name: String,
    /// Directory the torrent saved into.
    pub save_path: Option<PathBuf>,
    /// Content path reported by the client.
    pub content_path: Option<PathBuf>,
    /// Root path, from the hook or the client.
    pub root_path: Option<PathBuf>,
    /// Category, from the hook or the client.
    pub category: Option<String>,
    /// Relative file names.
    pub files: Vec<String>,
}

impl TorrentSnapshot {
    /// Merge hook arguments with whatever the client reported.
    #[must_use]
    pub fn assemble(
        job: &TorrentCompletionJob,
        info: Option<TorrentInfo>,
        properties: Option<TorrentProperties>,
        files: Vec<TorrentFile>,
    ) -> Self {
        let info = info.unwrap_or_default();
        let name = if job.name.is_empty() {
            info.name
        } else {
            job.name.clone()
        };
        let save_path = job
            .save_path
            .clone()
            .or(info.save_path)
            .or_else(|| properties.and_then(|props| props.save_path));
        Self {
            name,
            save_path,
            content_path: info.content_path,
            root_path: job.root_path.clone().or(info.root_path),
            category: job
                .category
                .clone()
                .or_else(|| info.category.filter(|category| !category.trim().is_empty())),
            files: files.into_iter().map(|file| file.name).collect(),
        }
    }

    /// Whether the torrent consists of exactly one file.
    #[must_use]
    pub const fn is_single_file(&self) -> bool {
        self.files.len() == 1
    }
}

/// On-disk shape of a torrent's downloaded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentDescriptor {
    /// The content is a single regular file.
    SingleFile {
        /// Path of the file.
        path: PathBuf,
    },
    /// The content is a directory that must be archived before upload.
    Directory {
        /// Path of the directory.
        path: PathBuf,
    },
    /// The content is a directory holding exactly one file.
    SingleFileInDirectory {
        /// Path of the containing directory.
        container: PathBuf,
        /// Path of the contained file.
        file: PathBuf,
    },
    /// No candidate path exists on disk.
    Unknown,
}

impl ContentDescriptor {
    /// Short label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SingleFile { .. } => "single_file",
            Self::Directory { .. } => "directory",
            Self::SingleFileInDirectory { .. } => "single_file_in_directory",
            Self::Unknown => "unknown",
        }
    }

    /// Primary path of the content, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SingleFile { path } | Self::Directory { path } => Some(path),
            Self::SingleFileInDirectory { file, .. } => Some(file),
            Self::Unknown => None,
        }
    }
}

/// Status label published on a torrent as the pipeline progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// The zip service is archiving the content.
    Zipping,
    /// The artifact is being uploaded.
    PreparingLink,
    /// The artifact is available in object storage.
    Ready,
    /// The artifact exists locally but could not be uploaded.
    UploadFailed,
    /// The content could not be located or archived.
    Error,
}

impl Tag {
    /// Every tag the pipeline may publish.
    pub const ALL: [Self; 5] = [
        Self::Zipping,
        Self::PreparingLink,
        Self::Ready,
        Self::UploadFailed,
        Self::Error,
    ];

    /// Label as displayed by the torrent client and the web UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Zipping => "Zipping",
            Self::PreparingLink => "Preparing Link",
            Self::Ready => "Ready",
            Self::UploadFailed => "Upload Failed",
            Self::Error => "Error",
        }
    }

    /// Whether the tag ends the pipeline.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::UploadFailed | Self::Error)
    }
}

impl Display for Tag {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> TorrentResult<TorrentCompletionJob> {
        TorrentCompletionJob::from_args(
            Some("Movie"),
            Some(" ABCDEF0123456789ABCDEF0123456789ABCDEF01 "),
            Some("/downloads"),
            Some(""),
            Some("  "),
        )
    }

    #[test]
    fn job_normalises_hash_and_blank_arguments() -> anyhow::Result<()> {
        let job = job()?;
        assert_eq!(
            job.info_hash.as_str(),
            "abcdef0123456789abcdef0123456789abcdef01"
        );
        assert!(job.info_hash.is_well_formed());
        assert_eq!(job.save_path.as_deref(), Some(Path::new("/downloads")));
        assert!(job.root_path.is_none());
        assert!(job.category.is_none());
        Ok(())
    }

    #[test]
    fn missing_hash_is_rejected() {
        let err = TorrentCompletionJob::from_args(Some("x"), Some("   "), None, None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            TorrentError::InvalidJob {
                field: "info_hash",
                reason: "missing"
            }
        ));
        assert!(TorrentCompletionJob::from_args(None, None, None, None, None).is_err());
    }

    #[test]
    fn malformed_hash_is_flagged_but_accepted() -> anyhow::Result<()> {
        let hash = InfoHash::parse("not-a-hash")?;
        assert!(!hash.is_well_formed());
        Ok(())
    }

    #[test]
    fn snapshot_prefers_hook_values_and_falls_back_to_client() -> anyhow::Result<()> {
        let mut job = job()?;
        job.save_path = None;
        let info = TorrentInfo {
            name: "Client Name".into(),
            save_path: None,
            content_path: Some("/data/Movie".into()),
            root_path: Some("/data/Movie".into()),
            category: Some("movies".into()),
            tags: Vec::new(),
        };
        let props = TorrentProperties {
            save_path: Some("/data".into()),
        };
        let files = vec![TorrentFile {
            index: 0,
            name: "Movie/movie.mkv".into(),
            size: 10,
        }];

        let snapshot = TorrentSnapshot::assemble(&job, Some(info), Some(props), files);
        assert_eq!(snapshot.name, "Movie");
        assert_eq!(snapshot.save_path.as_deref(), Some(Path::new("/data")));
        assert_eq!(snapshot.root_path.as_deref(), Some(Path::new("/data/Movie")));
        assert_eq!(snapshot.category.as_deref(), Some("movies"));
        assert!(snapshot.is_single_file());
        Ok(())
    }

    #[test]
    fn tags_expose_labels_and_terminality() -> anyhow::Result<()> {
        let terminal: Vec<Tag> = Tag::ALL.into_iter().filter(|tag| tag.is_terminal()).collect();
        assert_eq!(terminal, vec![Tag::Ready, Tag::UploadFailed, Tag::Error]);
        assert_eq!(Tag::PreparingLink.to_string(), "Preparing Link");
        assert_eq!(serde_json::to_string(&Tag::UploadFailed)?, "\"UploadFailed\"");
        Ok(())
    }

    #[test]
    fn descriptor_reports_primary_path() {
        let descriptor = ContentDescriptor::SingleFileInDirectory {
            container: "/d/Movie".into(),
            file: "/d/Movie/movie.mkv".into(),
        };
        assert_eq!(descriptor.kind(), "single_file_in_directory");
        assert_eq!(descriptor.path(), Some(Path::new("/d/Movie/movie.mkv")));
        assert!(ContentDescriptor::Unknown.path().is_none());
    }
}
