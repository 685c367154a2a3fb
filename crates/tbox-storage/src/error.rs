//! # Design
//!
//! - Constant messages; program, path and exit status travel as context.
//! - Only transfer failures are errors; cleanup problems are reported in the receipt.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors produced while uploading an artifact.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key inputs were unusable.
    #[error("invalid object key input")]
    InvalidKey {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// The local artifact does not exist or is not a regular file.
    #[error("upload source missing")]
    MissingSource {
        /// Path that was checked.
        path: PathBuf,
    },
    /// The transfer program could not be started.
    #[error("failed to launch transfer program")]
    Spawn {
        /// Program that was launched.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The transfer program exited unsuccessfully.
    #[error("transfer program failed")]
    CommandFailed {
        /// Program that was launched.
        program: String,
        /// Exit code, when the process was not killed by a signal.
        code: Option<i32>,
        /// Trailing stderr output.
        stderr: String,
    },
    /// Every transfer attempt failed.
    #[error("upload failed after retries")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Failure of the final attempt.
        #[source]
        last: Box<StorageError>,
    },
}
