//! Wiring of store, persistence, dispatcher and sweeper
//!
//! A [`CallbackService`] is an ordinary value: create as many as needed,
//! each with its own snapshot file. Nothing here is process-global.

use crate::config::InterludeConfig;
use crate::continuation::ContinuationRegistry;
use crate::dispatcher::{DispatchOutcome, ResolutionDispatcher};
use crate::error::InterludeResult;
use crate::event::InboundEvent;
use crate::persistence::PersistenceGateway;
use crate::reporter::{ErrorReporter, TracingReporter};
use crate::session::{NewSession, SessionStore};
use crate::sweeper::ExpirySweeper;
use crate::token::Token;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Running instance of the correlation store
pub struct CallbackService {
    config: InterludeConfig,
    store: Arc<SessionStore>,
    dispatcher: ResolutionDispatcher,
    persistence: Arc<PersistenceGateway>,
    reporter: Arc<dyn ErrorReporter>,
    shutdown: CancellationToken,
    sweeper: Option<JoinHandle<()>>,
}

impl CallbackService {
    /// Load the snapshot and assemble the service without starting the sweeper
    ///
    /// Never fails on a missing or corrupt snapshot; those start empty.
    pub async fn open(
        config: InterludeConfig,
        continuations: ContinuationRegistry,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let persistence = Arc::new(
            PersistenceGateway::new(&config.snapshot_path).with_reporter(reporter.clone()),
        );
        let snapshot = persistence.load().await;

        let store = Arc::new(
            SessionStore::new()
                .with_continuations(continuations)
                .with_reporter(reporter.clone())
                .with_persistence(persistence.clone()),
        );
        store.restore(snapshot);

        let dispatcher = ResolutionDispatcher::new(store.clone()).with_reporter(reporter.clone());

        Self {
            config,
            store,
            dispatcher,
            persistence,
            reporter,
            shutdown: CancellationToken::new(),
            sweeper: None,
        }
    }

    /// [`CallbackService::open`] with the default reporter, then start sweeping
    pub async fn start(config: InterludeConfig, continuations: ContinuationRegistry) -> Self {
        let mut service = Self::open(config, continuations, Arc::new(TracingReporter)).await;
        service.spawn_sweeper();
        service
    }

    /// Start the expiry sweeper if it is not already running
    pub fn spawn_sweeper(&mut self) {
        if self.sweeper.is_some() {
            return;
        }
        let sweeper = ExpirySweeper::new(self.store.clone(), self.config.sweep.clone())
            .with_reporter(self.reporter.clone());
        self.sweeper = Some(sweeper.spawn(self.shutdown.child_token()));
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &ResolutionDispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &InterludeConfig {
        &self.config
    }

    pub fn persistence(&self) -> &Arc<PersistenceGateway> {
        &self.persistence
    }

    /// Shorthand for [`SessionStore::create`]
    pub fn create(&self, request: NewSession) -> InterludeResult<Token> {
        self.store.create(request)
    }

    /// Shorthand for [`ResolutionDispatcher::on_external_event`]
    pub fn on_external_event(&self, event: InboundEvent) -> Option<JoinHandle<DispatchOutcome>> {
        self.dispatcher.on_external_event(event)
    }

    /// Stop the sweeper and write a final snapshot
    pub async fn shutdown(mut self) -> InterludeResult<()> {
        self.shutdown.cancel();
        if let Some(handle) = self.sweeper.take() {
            if let Err(e) = handle.await {
                warn!("Sweeper task ended abnormally: {}", e);
            }
        }

        self.store.flush().await?;
        info!(
            sessions = self.store.len(),
            path = %self.persistence.path().display(),
            "Callback service stopped"
        );
        Ok(())
    }
}

impl std::fmt::Debug for CallbackService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackService")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("sweeper_running", &self.sweeper.is_some())
            .finish()
    }
}
