//! Background eviction of expired sessions

use crate::config::SweepConfig;
use crate::error::InterludeError;
use crate::reporter::{ErrorReporter, TracingReporter};
use crate::session::SessionStore;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Long-lived task that periodically sweeps a [`SessionStore`]
///
/// The first pass runs as soon as the task starts; later passes run every
/// `config.interval`. A failing pass is reported and the loop keeps going.
pub struct ExpirySweeper {
    store: Arc<SessionStore>,
    config: SweepConfig,
    reporter: Arc<dyn ErrorReporter>,
}

impl ExpirySweeper {
    pub fn new(store: Arc<SessionStore>, config: SweepConfig) -> Self {
        Self {
            store,
            config,
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run the sweep loop on its own task until `shutdown` is cancelled
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Sweep loop; returns once `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval = ?self.config.interval,
            retention = ?self.config.retention,
            "Expiry sweeper started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep_once();
                }
            }
        }

        info!("Expiry sweeper stopped");
    }

    /// One pass; returns the number of evicted entries
    ///
    /// A panic inside the pass is reported as a sweep fault and counts as
    /// nothing evicted.
    pub fn sweep_once(&self) -> usize {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.store
                .sweep(self.config.retention, self.config.resolved_retention)
        }));

        match outcome {
            Ok(removed) => {
                debug!(removed, remaining = self.store.len(), "Sweep pass finished");
                removed
            }
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                self.reporter
                    .report(&InterludeError::sweep(format!("sweep pass panicked: {}", detail)));
                0
            }
        }
    }
}

impl std::fmt::Debug for ExpirySweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirySweeper")
            .field("config", &self.config)
            .finish()
    }
}
