//! Process-level span helpers.
//!
//! # Design
//! - One reconciler process handles one torrent, so the info-hash and run id
//!   live on a span entered for the whole process lifetime.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(mode: impl Into<String>, info_hash: &str, run_id: &str) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "app",
            mode = %mode,
            build_sha = %build_sha(),
            info_hash = %info_hash,
            run_id = %run_id,
        )));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Record the current application mode on the active span.
pub fn record_app_mode(mode: &str) {
    Span::current().record("mode", tracing::field::display(mode));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_enters_application_span() {
        let _guard = GlobalContextGuard::new("test", "abc", "run");
        record_app_mode("reconcile");
    }
}
