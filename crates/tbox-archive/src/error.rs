//! # Design
//!
//! - Constant messages; operation, URL and path travel as context.
//! - Convergence failures carry the counters observed when the loop gave up.

use std::error::Error;
use std::path::PathBuf;

use thiserror::Error;

use crate::convergence::FailureReason;

/// Result type for archive coordination.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors produced while requesting or awaiting an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The zip service could not be reached or its body could not be read.
    #[error("zip service request failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Underlying transport failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The zip service answered with a non-success status.
    #[error("zip service returned an error status")]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The zip service body did not match the expected shape.
    #[error("zip service response was malformed")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying decode failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The zip service refused to archive the content.
    #[error("zip service rejected the archive request")]
    Rejected {
        /// Message reported by the service, if any.
        message: Option<String>,
    },
    /// The service claimed the archive exists but it is missing or empty on disk.
    #[error("archive missing despite service report")]
    MissingArchive {
        /// Expected archive location.
        path: PathBuf,
    },
    /// The poll loop ran out of budget without the archive converging.
    #[error("archive did not converge")]
    NotConverged {
        /// Rule that ended the loop.
        reason: FailureReason,
        /// Poll iterations performed.
        attempts: u32,
        /// Zip service failures observed.
        errors: u32,
    },
}
