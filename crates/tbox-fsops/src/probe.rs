//! Filesystem probing seam.

use std::fs;
use std::path::Path;
use std::sync::Arc;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Nothing exists at the path (or it cannot be stat'ed).
    Missing,
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

impl PathKind {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

/// Read-only view of the filesystem used by the locator and the zip poll loop.
pub trait PathProbe: Send + Sync {
    /// Classify the path.
    fn kind(&self, path: &Path) -> PathKind;

    /// Size of the regular file at `path`, or `None` when it is absent.
    fn file_size(&self, path: &Path) -> Option<u64>;

    /// Whether anything exists at the path.
    fn exists(&self, path: &Path) -> bool {
        self.kind(path) != PathKind::Missing
    }
}

impl<P: PathProbe + ?Sized> PathProbe for Arc<P> {
    fn kind(&self, path: &Path) -> PathKind {
        (**self).kind(path)
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        (**self).file_size(path)
    }
}

/// Probe backed by `std::fs` metadata (symlinks are followed).
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskProbe;

impl PathProbe for DiskProbe {
    fn kind(&self, path: &Path) -> PathKind {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => PathKind::Directory,
            Ok(meta) if meta.is_file() => PathKind::File,
            _ => PathKind::Missing,
        }
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        fs::metadata(path)
            .ok()
            .filter(fs::Metadata::is_file)
            .map(|meta| meta.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_probe_classifies_paths() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("movie.mkv");
        fs::write(&file, b"abc")?;

        let probe = DiskProbe;
        assert_eq!(probe.kind(temp.path()), PathKind::Directory);
        assert_eq!(probe.kind(&file), PathKind::File);
        assert_eq!(probe.kind(&temp.path().join("absent")), PathKind::Missing);
        assert_eq!(probe.file_size(&file), Some(3));
        assert_eq!(probe.file_size(temp.path()), None);
        assert!(!probe.exists(&temp.path().join("absent")));
        Ok(())
    }
}
