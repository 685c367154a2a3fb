//! Temporary download directories shaped like finished torrents.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary save path holding torrent content.
#[derive(Debug)]
pub struct DownloadDir {
    temp: TempDir,
}

impl DownloadDir {
    /// Create an empty save path.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary directory cannot be created.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            temp: TempDir::new()?,
        })
    }

    /// Save path root.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `bytes` to `relative` under the save path, creating parents.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write(&self, relative: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.temp.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Lay out a single-file torrent at the save path root.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn single_file(&self, name: &str) -> anyhow::Result<PathBuf> {
        self.write(name, b"single file payload")
    }

    /// Lay out a multi-file torrent under `dir`, returning the directory.
    ///
    /// # Errors
    ///
    /// Returns an error when any file cannot be written.
    pub fn multi_file(&self, dir: &str, files: &[&str]) -> anyhow::Result<PathBuf> {
        for file in files {
            self.write(&format!("{dir}/{file}"), b"episode payload")?;
        }
        Ok(self.temp.path().join(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_file_creates_nested_layout() -> anyhow::Result<()> {
        let downloads = DownloadDir::new()?;
        let dir = downloads.multi_file("Show", &["e01.mkv", "extras/e00.mkv"])?;
        assert!(dir.join("e01.mkv").is_file());
        assert!(dir.join("extras").join("e00.mkv").is_file());
        Ok(())
    }
}
