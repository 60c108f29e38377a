//! Error-report collaborator for recoverable failures.
//!
//! The cache engine never surfaces a failed write-back to the caller.
//! Instead it hands the error to an [`ErrorReporter`] and moves on. The
//! production wiring forwards to the platform error-log pipeline; the
//! default implementation here forwards to `tracing`.

use crate::VireoError;

/// Severity attached to a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Fire-and-forget error sink.
///
/// Implementations must not block: `report` is called from the read path's
/// detached write-back tasks and from other places that cannot wait on a
/// downstream log store.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &VireoError, severity: Severity);
}

/// Default reporter that forwards to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &VireoError, severity: Severity) {
        match severity {
            Severity::Low => tracing::info!(error = %error, "recoverable cache error"),
            Severity::Medium => tracing::warn!(error = %error, "recoverable cache error"),
            Severity::High => tracing::error!(error = %error, "recoverable cache error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BackendError;
    use std::sync::Mutex;

    struct RecordingReporter {
        seen: Mutex<Vec<Severity>>,
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&self, _error: &VireoError, severity: Severity) {
            self.seen
                .lock()
                .expect("reporter lock should not be poisoned")
                .push(severity);
        }
    }

    #[test]
    fn test_reporter_receives_severity() {
        let reporter = RecordingReporter {
            seen: Mutex::new(Vec::new()),
        };
        let err = VireoError::from(BackendError::LockPoisoned);

        reporter.report(&err, Severity::Medium);
        reporter.report(&err, Severity::High);

        let seen = reporter
            .seen
            .lock()
            .expect("reporter lock should not be poisoned");
        assert_eq!(seen.as_slice(), &[Severity::Medium, Severity::High]);
    }

    #[test]
    fn test_tracing_reporter_does_not_panic() {
        let err = VireoError::from(BackendError::Unavailable {
            reason: "down".to_string(),
        });
        TracingReporter.report(&err, Severity::Low);
        TracingReporter.report(&err, Severity::Medium);
        TracingReporter.report(&err, Severity::High);
    }
}
