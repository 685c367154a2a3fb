//! Zip service contract and wire types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tbox_torrent_core::InfoHash;

use crate::error::ArchiveResult;

/// Status reported by the zip service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZipStatus {
    /// The archive is already present.
    Exists,
    /// Archiving is in progress.
    Zipping,
    /// Archiving finished.
    Complete,
    /// The service failed or refused the job.
    Error,
    /// Any status this client does not recognise; treated like `Zipping`.
    #[serde(other)]
    Unknown,
}

impl ZipStatus {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::Zipping => "zipping",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

/// Body of `POST {base}/zip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZipRequest {
    /// Torrent identifier, used by the service to track progress.
    pub hash: String,
    /// Directory to archive.
    pub source: String,
    /// Archive path to produce.
    pub target: String,
}

/// Reply to both the start and the progress calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZipReply {
    /// Reported status.
    pub status: ZipStatus,
    /// Reported completion percentage.
    #[serde(default)]
    pub progress: Option<f64>,
    /// Free-form detail, usually present with `error`.
    #[serde(default)]
    pub message: Option<String>,
}

impl ZipReply {
    /// Reply with a status and no detail.
    #[must_use]
    pub const fn status(status: ZipStatus) -> Self {
        Self {
            status,
            progress: None,
            message: None,
        }
    }

    /// `zipping` reply carrying a progress percentage.
    #[must_use]
    pub const fn zipping(progress: f64) -> Self {
        Self {
            status: ZipStatus::Zipping,
            progress: Some(progress),
            message: None,
        }
    }
}

/// Server-side archiver.
#[async_trait]
pub trait ZipService: Send + Sync {
    /// Ask the service to archive `request.source` into `request.target`.
    async fn start(&self, request: &ZipRequest) -> ArchiveResult<ZipReply>;

    /// Query the progress of a previously started job.
    async fn progress(&self, hash: &InfoHash) -> ArchiveResult<ZipReply>;
}
