//! Poll loop that drives a zip job to convergence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tbox_config::ZipPollPolicy;
use tbox_fsops::PathProbe;
use tbox_torrent_core::InfoHash;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::convergence::{
    ConvergenceReason, FailureReason, Observation, RemoteSignal, Verdict, ZipProgressState,
};
use crate::error::{ArchiveError, ArchiveResult};
use crate::service::{ZipRequest, ZipService, ZipStatus};

/// A converged archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipOutcome {
    /// Archive location.
    pub path: PathBuf,
    /// Size observed when the loop converged.
    pub size: u64,
    /// Rule that declared success.
    pub reason: ConvergenceReason,
    /// Poll iterations performed.
    pub attempts: u32,
}

/// Requests an archive from the zip service and waits for it to settle.
#[derive(Clone)]
pub struct ZipCoordinator {
    service: Arc<dyn ZipService>,
    probe: Arc<dyn PathProbe>,
    policy: ZipPollPolicy,
}

impl ZipCoordinator {
    /// Build a coordinator.
    #[must_use]
    pub fn new(
        service: Arc<dyn ZipService>,
        probe: Arc<dyn PathProbe>,
        policy: ZipPollPolicy,
    ) -> Self {
        Self {
            service,
            probe,
            policy,
        }
    }

    /// Ensure `target` holds a settled archive of `source`.
    ///
    /// # Errors
    ///
    /// - `ArchiveError::Rejected` when the service refuses the job.
    /// - `ArchiveError::MissingArchive` when the service reports an archive
    ///   that is not on disk.
    /// - `ArchiveError::NotConverged` when a budget runs out.
    pub async fn ensure_archive(
        &self,
        hash: &InfoHash,
        source: &Path,
        target: &Path,
    ) -> ArchiveResult<ZipOutcome> {
        let request = ZipRequest {
            hash: hash.to_string(),
            source: source.display().to_string(),
            target: target.display().to_string(),
        };
        let mut state = ZipProgressState::new();

        match self.service.start(&request).await {
            Ok(reply) => match reply.status {
                ZipStatus::Exists | ZipStatus::Complete => {
                    return self.verify_existing(target, reply.status);
                }
                ZipStatus::Error => {
                    warn!(
                        info_hash = %hash,
                        message = reply.message.as_deref().unwrap_or_default(),
                        "zip service rejected archive request"
                    );
                    return Err(ArchiveError::Rejected {
                        message: reply.message,
                    });
                }
                ZipStatus::Zipping | ZipStatus::Unknown => {
                    info!(
                        info_hash = %hash,
                        target = %target.display(),
                        "zip job started"
                    );
                }
            },
            Err(err) => {
                warn!(
                    info_hash = %hash,
                    error = %err,
                    "zip start request failed; polling anyway"
                );
                state.record_error();
            }
        }

        self.poll(hash, target, state).await
    }

    fn verify_existing(&self, target: &Path, status: ZipStatus) -> ArchiveResult<ZipOutcome> {
        match self.probe.file_size(target).filter(|size| *size > 0) {
            Some(size) => {
                info!(
                    path = %target.display(),
                    size,
                    status = status.as_str(),
                    "archive already present"
                );
                Ok(ZipOutcome {
                    path: target.to_path_buf(),
                    size,
                    reason: ConvergenceReason::AlreadyExists,
                    attempts: 0,
                })
            }
            None => {
                warn!(
                    path = %target.display(),
                    status = status.as_str(),
                    "zip service reported an archive that is missing or empty"
                );
                Err(ArchiveError::MissingArchive {
                    path: target.to_path_buf(),
                })
            }
        }
    }

    async fn poll(
        &self,
        hash: &InfoHash,
        target: &Path,
        mut state: ZipProgressState,
    ) -> ArchiveResult<ZipOutcome> {
        loop {
            sleep(self.policy.interval).await;

            let remote = match self.service.progress(hash).await {
                Ok(reply) => RemoteSignal::Reply {
                    status: reply.status,
                    progress: reply.progress,
                },
                Err(err) => {
                    warn!(info_hash = %hash, error = %err, "zip progress check failed");
                    RemoteSignal::Failed
                }
            };
            let local_size = self.probe.file_size(target);
            state.observe(Observation { remote, local_size });

            debug!(
                info_hash = %hash,
                attempt = state.attempts(),
                errors = state.errors(),
                progress = state.last_progress(),
                size = local_size,
                "zip poll"
            );

            match state.verdict(&self.policy) {
                Verdict::Continue => {}
                Verdict::Converged(reason) => {
                    let size = state.last_size().unwrap_or(0);
                    info!(
                        info_hash = %hash,
                        reason = reason.as_str(),
                        attempts = state.attempts(),
                        size,
                        "archive converged"
                    );
                    return Ok(ZipOutcome {
                        path: target.to_path_buf(),
                        size,
                        reason,
                        attempts: state.attempts(),
                    });
                }
                Verdict::Failed(FailureReason::CompleteWithoutArchive) => {
                    warn!(
                        info_hash = %hash,
                        path = %target.display(),
                        "zip service reported completion without an archive on disk"
                    );
                    return Err(ArchiveError::MissingArchive {
                        path: target.to_path_buf(),
                    });
                }
                Verdict::Failed(reason) => {
                    warn!(
                        info_hash = %hash,
                        reason = reason.as_str(),
                        attempts = state.attempts(),
                        errors = state.errors(),
                        "archive did not converge"
                    );
                    return Err(ArchiveError::NotConverged {
                        reason,
                        attempts: state.attempts(),
                        errors: state.errors(),
                    });
                }
            }
        }
    }
}
