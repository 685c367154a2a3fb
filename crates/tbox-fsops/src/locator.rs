//! Content locator: classifies a completed torrent's on-disk layout.
//!
//! # Design
//! - Candidates are produced lazily in priority order; the first one that
//!   exists on disk decides the descriptor.
//! - The locator never fails: nothing found yields `ContentDescriptor::Unknown`.

use std::path::{Path, PathBuf};

use tbox_torrent_core::{ContentDescriptor, TorrentSnapshot};
use tracing::{debug, info};

use crate::probe::{PathKind, PathProbe};

/// Where a candidate path came from, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Content path reported by the torrent client.
    ContentPath,
    /// Root path supplied by the hook or the client.
    RootPath,
    /// `save_path/<file>` for a single-file torrent.
    SaveFile,
    /// `save_path/<torrent name>/<file>` for a single-file torrent.
    NamedFile,
    /// `save_path/<torrent name>` for a multi-file torrent.
    NamedDirectory,
    /// `save_path/<first segment of the first file>`.
    CommonPrefix,
    /// `save_path` itself, for a multi-file torrent.
    SavePath,
}

impl CandidateSource {
    const SINGLE_FILE_ORDER: [Self; 5] = [
        Self::ContentPath,
        Self::RootPath,
        Self::SaveFile,
        Self::NamedFile,
        Self::CommonPrefix,
    ];

    const MULTI_FILE_ORDER: [Self; 5] = [
        Self::ContentPath,
        Self::RootPath,
        Self::NamedDirectory,
        Self::CommonPrefix,
        Self::SavePath,
    ];

    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContentPath => "content_path",
            Self::RootPath => "root_path",
            Self::SaveFile => "save_path_file",
            Self::NamedFile => "save_path_name_file",
            Self::NamedDirectory => "save_path_name",
            Self::CommonPrefix => "common_prefix",
            Self::SavePath => "save_path",
        }
    }

    /// Evaluation order for the given snapshot.
    #[must_use]
    pub fn order(snapshot: &TorrentSnapshot) -> &'static [Self] {
        if snapshot.is_single_file() {
            &Self::SINGLE_FILE_ORDER
        } else {
            &Self::MULTI_FILE_ORDER
        }
    }

    /// Candidate path this source proposes, if the snapshot has the inputs for it.
    #[must_use]
    pub fn candidate(self, snapshot: &TorrentSnapshot) -> Option<PathBuf> {
        let save_path = snapshot.save_path.as_deref();
        let name = Some(snapshot.name.trim()).filter(|name| !name.is_empty());
        let first_file = snapshot.files.first().map(String::as_str);

        match self {
            Self::ContentPath => snapshot.content_path.clone(),
            Self::RootPath => snapshot.root_path.clone(),
            Self::SaveFile => Some(join_relative(save_path?, first_file?)),
            Self::NamedFile => Some(join_relative(&save_path?.join(name?), first_file?)),
            Self::NamedDirectory => Some(save_path?.join(name?)),
            Self::CommonPrefix => {
                let mut segments = segments(first_file?);
                let prefix = segments.next()?;
                segments.next()?;
                Some(save_path?.join(prefix))
            }
            // An empty file list gives no evidence the save path holds this torrent.
            Self::SavePath if snapshot.files.is_empty() => None,
            Self::SavePath => save_path.map(Path::to_path_buf),
        }
    }
}

/// Classifies torrent content using an injected [`PathProbe`].
#[derive(Debug, Clone)]
pub struct ContentLocator<P> {
    probe: P,
}

impl<P: PathProbe> ContentLocator<P> {
    /// Build a locator over the given probe.
    #[must_use]
    pub const fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Classify the snapshot's content; first existing candidate wins.
    #[must_use]
    pub fn locate(&self, snapshot: &TorrentSnapshot) -> ContentDescriptor {
        let found = CandidateSource::order(snapshot).iter().find_map(|source| {
            let path = source.candidate(snapshot)?;
            let descriptor = self.classify(&path, snapshot);
            debug!(
                source = source.as_str(),
                path = %path.display(),
                found = descriptor.is_some(),
                "evaluated content candidate"
            );
            descriptor.map(|descriptor| (*source, descriptor))
        });

        match found {
            Some((source, descriptor)) => {
                info!(
                    source = source.as_str(),
                    kind = descriptor.kind(),
                    "content located"
                );
                descriptor
            }
            None => {
                info!(files = snapshot.files.len(), "no content candidate exists on disk");
                ContentDescriptor::Unknown
            }
        }
    }

    fn classify(&self, path: &Path, snapshot: &TorrentSnapshot) -> Option<ContentDescriptor> {
        match self.probe.kind(path) {
            PathKind::Missing => None,
            PathKind::File => Some(ContentDescriptor::SingleFile {
                path: path.to_path_buf(),
            }),
            PathKind::Directory => {
                let member = snapshot
                    .files
                    .first()
                    .filter(|_| snapshot.is_single_file())
                    .and_then(|member| self.resolve_member(path, member));
                Some(match member {
                    Some(file) => ContentDescriptor::SingleFileInDirectory {
                        container: path.to_path_buf(),
                        file,
                    },
                    None => ContentDescriptor::Directory {
                        path: path.to_path_buf(),
                    },
                })
            }
        }
    }

    /// Find the single member inside `dir`: with the directory's own name
    /// stripped from the relative path, then the full relative path, then the
    /// bare file name.
    fn resolve_member(&self, dir: &Path, relative: &str) -> Option<PathBuf> {
        let dir_name = dir.file_name().and_then(|name| name.to_str());
        let parts: Vec<&str> = segments(relative).collect();

        let stripped = match (dir_name, parts.split_first()) {
            (Some(dir_name), Some((head, rest))) if *head == dir_name && !rest.is_empty() => {
                Some(rest.join("/"))
            }
            _ => None,
        };
        let full = Some(parts.join("/"));
        let bare = parts.last().map(|name| (*name).to_string());

        [stripped, full, bare]
            .into_iter()
            .flatten()
            .map(|candidate| join_relative(dir, &candidate))
            .find(|candidate| self.probe.kind(candidate) == PathKind::File)
    }
}

/// Sibling archive path for a directory: `<parent>/<dir name>.zip`.
///
/// Falls back to `<fallback>.zip` when the directory has no final component.
#[must_use]
pub fn archive_path_for(dir: &Path, fallback: &str) -> PathBuf {
    let stem = dir
        .file_name()
        .map_or_else(|| fallback.to_string(), |name| name.to_string_lossy().into_owned());
    let parent = dir.parent().unwrap_or(dir);
    parent.join(format!("{stem}.zip"))
}

fn segments(relative: &str) -> impl Iterator<Item = &str> {
    relative
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
}

fn join_relative(base: &Path, relative: &str) -> PathBuf {
    segments(relative).fold(base.to_path_buf(), |path, segment| path.join(segment))
}
