//! Error types for torrent client interactions.

use std::error::Error;

use thiserror::Error;

/// Primary error type for torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// Job inputs were missing or malformed.
    #[error("invalid torrent job")]
    InvalidJob {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The client rejected the configured credentials.
    #[error("torrent client authentication failed")]
    Unauthorized {
        /// Operation that required authentication.
        operation: &'static str,
    },
    /// The request could not be delivered or its response could not be read.
    #[error("torrent client request failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Underlying transport failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The client answered with a non-success status.
    #[error("torrent client returned an error status")]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// HTTP status code returned by the client.
        status: u16,
    },
    /// The client response body did not match the expected shape.
    #[error("torrent client response was malformed")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying decode failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The torrent is unknown to the client.
    #[error("torrent not found")]
    NotFound {
        /// Info-hash that was looked up.
        info_hash: String,
    },
}

/// Convenience alias for torrent operation results.
pub type TorrentResult<T> = Result<T, TorrentError>;
