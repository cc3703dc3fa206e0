//! Single sink for faults that are handled locally
//!
//! Persistence failures, malformed events, stale tokens, failing
//! continuations and failed sweeps never propagate as process-level faults.
//! They all pass through an [`ErrorReporter`] instead of being dropped.

use crate::error::{InterludeError, UnifiedError};
use tracing::{error, warn};

/// Receives every swallowed fault
#[cfg_attr(test, mockall::automock)]
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &InterludeError);
}

/// Reporter that writes to the `tracing` pipeline
///
/// Expected noise (stale buttons, replays, junk payloads) is logged at `warn`,
/// everything else at `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, err: &InterludeError) {
        if err.is_expected_noise() {
            warn!(
                error_code = err.error_code(),
                context = err.context().unwrap_or(""),
                "{}",
                err
            );
        } else {
            error!(
                error_code = err.error_code(),
                context = err.context().unwrap_or(""),
                "{}",
                err
            );
        }
    }
}
