//! Pure convergence policy for the zip poll loop.
//!
//! The loop feeds one [`Observation`] per iteration into a
//! [`ZipProgressState`]; [`ZipProgressState::verdict`] decides, from the
//! state alone, whether to keep polling. Rules are checked in order and the
//! first that holds wins:
//!
//! 1. the service reports `complete` or `exists`;
//! 2. the local size is unchanged for `size_stable_checks` observations;
//! 3. progress is stalled above `stall_min_progress` with a large, settled file;
//! 4. the latest service call failed but the local file has settled;
//! 5. the attempt budget is spent (success only with a non-empty file);
//! 6. the error budget is spent.
//!
//! Stability-based success does not verify archive integrity.

use tbox_config::ZipPollPolicy;

use crate::service::ZipStatus;

/// What the zip service said on one poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteSignal {
    /// The service answered.
    Reply {
        /// Reported status.
        status: ZipStatus,
        /// Reported progress percentage.
        progress: Option<f64>,
    },
    /// The call failed (transport, status or decode error).
    Failed,
}

/// One poll iteration's inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Zip service signal.
    pub remote: RemoteSignal,
    /// Local archive size; `None` while the file does not exist.
    pub local_size: Option<u64>,
}

/// Why the loop declared success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceReason {
    /// The service reported the archive present before polling began.
    AlreadyExists,
    /// The service reported `complete` or `exists` while polling.
    RemoteComplete,
    /// The local file stopped growing.
    SizeStable,
    /// Progress stalled near the end with a settled file.
    ProgressStalled,
    /// The service is failing but the local file settled.
    DegradedStable,
    /// Attempts ran out with a non-empty file on disk.
    AttemptBudget,
}

impl ConvergenceReason {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyExists => "already_exists",
            Self::RemoteComplete => "remote_complete",
            Self::SizeStable => "size_stable",
            Self::ProgressStalled => "progress_stalled",
            Self::DegradedStable => "degraded_stable",
            Self::AttemptBudget => "attempt_budget",
        }
    }
}

/// Why the loop gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The service reported completion but no non-empty archive is on disk.
    CompleteWithoutArchive,
    /// Attempts ran out without a non-empty file.
    AttemptsExhausted,
    /// Too many zip service failures.
    ErrorsExhausted,
}

impl FailureReason {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompleteWithoutArchive => "complete_without_archive",
            Self::AttemptsExhausted => "attempts_exhausted",
            Self::ErrorsExhausted => "errors_exhausted",
        }
    }
}

/// Decision for the current iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep polling.
    Continue,
    /// The archive is ready.
    Converged(ConvergenceReason),
    /// Stop polling and fail.
    Failed(FailureReason),
}

/// Mutable state of one poll loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZipProgressState {
    attempts: u32,
    errors: u32,
    last_progress: Option<f64>,
    progress_unchanged: u32,
    last_size: Option<u64>,
    size_unchanged: u32,
    last_remote_failed: bool,
    remote_complete: bool,
}

impl ZipProgressState {
    /// Fresh state for a new loop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a zip service failure that happened outside a poll iteration.
    pub const fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
        self.last_remote_failed = true;
    }

    /// Fold one iteration's observation into the state.
    pub fn observe(&mut self, observation: Observation) {
        self.attempts = self.attempts.saturating_add(1);

        match observation.remote {
            RemoteSignal::Failed
            | RemoteSignal::Reply {
                status: ZipStatus::Error,
                ..
            } => self.record_error(),
            RemoteSignal::Reply { status, progress } => {
                self.last_remote_failed = false;
                self.remote_complete = matches!(status, ZipStatus::Complete | ZipStatus::Exists);
                if let Some(progress) = progress {
                    self.track_progress(progress);
                }
            }
        }

        match observation.local_size {
            Some(size) if self.last_size == Some(size) => {
                self.size_unchanged = self.size_unchanged.saturating_add(1);
            }
            size => {
                self.last_size = size;
                self.size_unchanged = 0;
            }
        }
    }

    #[allow(clippy::float_cmp)]
    fn track_progress(&mut self, progress: f64) {
        if self.last_progress == Some(progress) {
            self.progress_unchanged = self.progress_unchanged.saturating_add(1);
        } else {
            self.last_progress = Some(progress);
            self.progress_unchanged = 0;
        }
    }

    /// Decide what the loop should do next.
    #[must_use]
    pub fn verdict(&self, policy: &ZipPollPolicy) -> Verdict {
        let size = self.last_size.unwrap_or(0);

        if self.remote_complete {
            return if size > 0 {
                Verdict::Converged(ConvergenceReason::RemoteComplete)
            } else {
                Verdict::Failed(FailureReason::CompleteWithoutArchive)
            };
        }
        if size > 0 && self.size_unchanged >= policy.size_stable_checks {
            return Verdict::Converged(ConvergenceReason::SizeStable);
        }
        if self.progress_unchanged >= policy.progress_stall_checks
            && self
                .last_progress
                .is_some_and(|progress| progress > policy.stall_min_progress)
            && size > policy.stall_min_size_bytes
            && self.size_unchanged >= policy.stall_size_stable_checks
        {
            return Verdict::Converged(ConvergenceReason::ProgressStalled);
        }
        if self.last_remote_failed
            && size > 0
            && self.size_unchanged >= policy.degraded_stable_checks()
        {
            return Verdict::Converged(ConvergenceReason::DegradedStable);
        }
        if self.attempts >= policy.max_attempts {
            return if size > 0 {
                Verdict::Converged(ConvergenceReason::AttemptBudget)
            } else {
                Verdict::Failed(FailureReason::AttemptsExhausted)
            };
        }
        if self.errors >= policy.max_errors {
            return Verdict::Failed(FailureReason::ErrorsExhausted);
        }
        Verdict::Continue
    }

    /// Poll iterations observed so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Zip service failures observed so far.
    #[must_use]
    pub const fn errors(&self) -> u32 {
        self.errors
    }

    /// Most recent local size.
    #[must_use]
    pub const fn last_size(&self) -> Option<u64> {
        self.last_size
    }

    /// Most recent reported progress.
    #[must_use]
    pub const fn last_progress(&self) -> Option<f64> {
        self.last_progress
    }
}
