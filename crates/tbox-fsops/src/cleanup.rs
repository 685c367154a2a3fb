//! Removal helpers used after a successful upload.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{FsOpsError, FsOpsResult};

/// Delete a regular file.
///
/// # Errors
///
/// Returns `FsOpsError::InvalidInput` when the path is not a file, or
/// `FsOpsError::Io` when removal fails.
pub fn remove_file(path: &Path) -> FsOpsResult<()> {
    let meta =
        fs::symlink_metadata(path).map_err(|err| FsOpsError::io("cleanup.stat", path, err))?;
    if meta.is_dir() {
        return Err(FsOpsError::InvalidInput {
            field: "file",
            reason: "is_directory",
            value: Some(path.display().to_string()),
        });
    }
    fs::remove_file(path).map_err(|err| FsOpsError::io("cleanup.remove_file", path, err))?;
    debug!(path = %path.display(), "removed file");
    Ok(())
}

/// Recursively delete a directory.
///
/// A filesystem root is refused.
///
/// # Errors
///
/// Returns `FsOpsError::InvalidInput` when the path is a root or not a
/// directory, or `FsOpsError::Io` when removal fails.
pub fn remove_directory(path: &Path) -> FsOpsResult<()> {
    if path.parent().is_none() {
        return Err(FsOpsError::InvalidInput {
            field: "directory",
            reason: "is_root",
            value: Some(path.display().to_string()),
        });
    }
    let meta =
        fs::symlink_metadata(path).map_err(|err| FsOpsError::io("cleanup.stat", path, err))?;
    if !meta.is_dir() {
        return Err(FsOpsError::InvalidInput {
            field: "directory",
            reason: "not_a_directory",
            value: Some(path.display().to_string()),
        });
    }
    fs::remove_dir_all(path).map_err(|err| FsOpsError::io("cleanup.remove_dir", path, err))?;
    debug!(path = %path.display(), "removed directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult<T> = anyhow::Result<T>;

    #[test]
    fn remove_file_deletes_and_reports_missing() -> TestResult<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("a.zip");
        fs::write(&file, b"zip")?;

        remove_file(&file)?;
        assert!(!file.exists());

        let err = remove_file(&file).unwrap_err();
        assert!(matches!(
            err,
            FsOpsError::Io {
                operation: "cleanup.stat",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn remove_file_refuses_directories() -> TestResult<()> {
        let temp = tempfile::tempdir()?;
        let err = remove_file(temp.path()).unwrap_err();
        assert!(matches!(
            err,
            FsOpsError::InvalidInput {
                reason: "is_directory",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn remove_directory_is_recursive() -> TestResult<()> {
        let temp = tempfile::tempdir()?;
        let dir = temp.path().join("Show");
        fs::create_dir_all(dir.join("Season 1"))?;
        fs::write(dir.join("Season 1").join("e01.mkv"), b"x")?;

        remove_directory(&dir)?;
        assert!(!dir.exists());
        assert!(matches!(
            remove_directory(Path::new("/")).unwrap_err(),
            FsOpsError::InvalidInput {
                reason: "is_root",
                ..
            }
        ));
        Ok(())
    }
}
