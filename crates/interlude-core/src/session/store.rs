//! Token → session map shared by issuers, resolvers and the sweeper
//!
//! Every structural access goes through one mutex per store. The critical
//! sections only touch the map: continuations run on their own task and
//! snapshot I/O happens after the lock is released.

use super::entry::{NewSession, SessionEntry};
use super::snapshot::StoreSnapshot;
use crate::clock::{Clock, SystemClock};
use crate::continuation::ContinuationRegistry;
use crate::error::{InterludeError, InterludeResult};
use crate::event::InboundEvent;
use crate::persistence::PersistenceGateway;
use crate::reporter::{ErrorReporter, TracingReporter};
use crate::token::{Token, TokenGenerator};
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct StoreState {
    sessions: HashMap<Token, SessionEntry>,
    /// Bumped on every mutation that schedules a snapshot
    generation: u64,
}

/// Outcome of a successful [`SessionStore::resolve`]
#[derive(Debug)]
pub struct Resolution {
    /// The session as it was right after the selection was recorded
    pub session: SessionEntry,
    /// Task running the continuation; the store never waits for it
    pub continuation: JoinHandle<()>,
}

/// Store of pending interactions
pub struct SessionStore {
    state: Mutex<StoreState>,
    tokens: TokenGenerator,
    clock: Arc<dyn Clock>,
    continuations: ContinuationRegistry,
    reporter: Arc<dyn ErrorReporter>,
    persistence: Option<Arc<PersistenceGateway>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create an empty, in-memory store
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            tokens: TokenGenerator::new(),
            clock: Arc::new(SystemClock),
            continuations: ContinuationRegistry::new(),
            reporter: Arc::new(TracingReporter),
            persistence: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_continuations(mut self, continuations: ContinuationRegistry) -> Self {
        self.continuations = continuations;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Snapshot every mutation through `gateway`
    pub fn with_persistence(mut self, gateway: Arc<PersistenceGateway>) -> Self {
        self.persistence = Some(gateway);
        self
    }

    /// Replace the contents of the store with `snapshot`
    ///
    /// The token counter only ever moves forward: it ends up at the largest of
    /// its current value, the persisted counter and the highest token present.
    pub fn restore(&self, snapshot: StoreSnapshot) {
        let floor = snapshot.counter.max(snapshot.highest_issued());
        let mut state = self.state.lock();
        state.sessions = snapshot
            .entries
            .into_iter()
            .map(|entry| (entry.token.clone(), entry))
            .collect();
        self.tokens.advance_to(floor);
        info!(
            sessions = state.sessions.len(),
            counter = self.tokens.current(),
            "Restored session store"
        );
    }

    /// Start a new interaction and return its token
    ///
    /// The entry is visible to `resolve` before this returns. A snapshot is
    /// scheduled in the background; its failure does not fail `create`. The
    /// only error is an exhausted token counter, in which case nothing is
    /// inserted.
    pub fn create(&self, request: NewSession) -> InterludeResult<Token> {
        let counter = self
            .tokens
            .next()
            .ok_or_else(|| InterludeError::tokens_exhausted(self.tokens.current()))?;
        let token = Token::from_counter(counter);
        let entry = SessionEntry::new(token.clone(), request, self.clock.now());
        let option_count = entry.options.len();

        let snapshot = {
            let mut state = self.state.lock();
            state.sessions.insert(token.clone(), entry);
            self.capture(&mut state)
        };
        self.schedule_snapshot(snapshot);

        debug!(token = %token, options = option_count, "Issued token");
        Ok(token)
    }

    /// Record the user's selection and resume the continuation
    ///
    /// Fails without touching the store when the token is unknown, already
    /// resolved, or `selection` is not one of its options. On success the
    /// continuation is spawned on its own task and this returns immediately.
    pub fn resolve(
        &self,
        token: &str,
        selection: usize,
        event: InboundEvent,
    ) -> InterludeResult<Resolution> {
        let runtime = Handle::try_current().map_err(|_| {
            InterludeError::runtime("resolve must be called from within a tokio runtime")
        })?;
        let now = self.clock.now();

        let (session, snapshot) = {
            let mut state = self.state.lock();
            let entry = state
                .sessions
                .get_mut(token)
                .ok_or_else(|| InterludeError::unknown_token(token))?;

            if let Some(previous) = entry.selection {
                return Err(InterludeError::already_resolved(token, previous));
            }
            if selection >= entry.options.len() {
                return Err(InterludeError::invalid_selection(
                    token,
                    selection,
                    entry.options.len(),
                ));
            }

            entry.selection = Some(selection);
            entry.resolved_event = Some(event);
            entry.resolved_at = Some(now);
            let session = entry.clone();

            (session, self.capture(&mut state))
        };
        self.schedule_snapshot(snapshot);

        debug!(token = %session.token, selection, kind = %session.resume.kind, "Resolved token");
        let continuation = self.spawn_continuation(&runtime, session.clone());
        Ok(Resolution {
            session,
            continuation,
        })
    }

    fn spawn_continuation(&self, runtime: &Handle, session: SessionEntry) -> JoinHandle<()> {
        let handler = self.continuations.get(&session.resume.kind);
        let reporter = self.reporter.clone();

        runtime.spawn(async move {
            let Some(handler) = handler else {
                reporter.report(&InterludeError::continuation(
                    session.token.as_str(),
                    &session.resume.kind,
                    "no handler registered for this kind",
                ));
                return;
            };

            match AssertUnwindSafe(handler.on_resolved(&session))
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => debug!(token = %session.token, "Continuation completed"),
                Ok(Err(e)) => reporter.report(&InterludeError::continuation(
                    session.token.as_str(),
                    &session.resume.kind,
                    format!("{:#}", e),
                )),
                Err(_) => reporter.report(&InterludeError::continuation(
                    session.token.as_str(),
                    &session.resume.kind,
                    "continuation panicked",
                )),
            }
        })
    }

    /// Remove every entry at least `retention` old; returns how many went
    pub fn sweep_expired(&self, retention: Duration) -> usize {
        self.sweep(retention, None)
    }

    /// Remove expired entries, plus resolved ones older than
    /// `resolved_retention` since their resolution; returns how many went
    ///
    /// Runs under the same lock as `resolve`, so a concurrent resolution of a
    /// swept token either completes first or sees the token as unknown.
    pub fn sweep(&self, retention: Duration, resolved_retention: Option<Duration>) -> usize {
        let now = self.clock.now();

        let (removed, snapshot) = {
            let mut state = self.state.lock();
            let before = state.sessions.len();
            state.sessions.retain(|_, entry| {
                let stale_resolution =
                    resolved_retention.is_some_and(|keep| entry.is_resolution_stale(now, keep));
                !(entry.is_expired(now, retention) || stale_resolution)
            });
            let removed = before - state.sessions.len();

            let snapshot = if removed > 0 {
                self.capture(&mut state)
            } else {
                None
            };
            (removed, snapshot)
        };
        self.schedule_snapshot(snapshot);

        if removed > 0 {
            info!(removed, "Swept expired sessions");
        }
        removed
    }

    /// Drop a single entry
    pub fn remove(&self, token: &str) -> Option<SessionEntry> {
        let (removed, snapshot) = {
            let mut state = self.state.lock();
            let removed = state.sessions.remove(token);
            let snapshot = if removed.is_some() {
                self.capture(&mut state)
            } else {
                None
            };
            (removed, snapshot)
        };
        self.schedule_snapshot(snapshot);
        removed
    }

    /// Copy of the entry stored under `token`
    pub fn get(&self, token: &str) -> Option<SessionEntry> {
        self.state.lock().sessions.get(token).cloned()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.state.lock().sessions.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last counter value issued
    pub fn counter(&self) -> u64 {
        self.tokens.current()
    }

    /// Consistent copy of the counter and every entry
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut state = self.state.lock();
        state.generation += 1;
        self.build_snapshot(&state)
    }

    /// Write a snapshot now and wait for it
    ///
    /// A no-op for stores without persistence.
    pub async fn flush(&self) -> InterludeResult<()> {
        let Some(gateway) = self.persistence.clone() else {
            return Ok(());
        };
        let snapshot = self.snapshot();
        gateway.save(&snapshot).await
    }

    fn capture(&self, state: &mut StoreState) -> Option<StoreSnapshot> {
        self.persistence.as_ref()?;
        state.generation += 1;
        Some(self.build_snapshot(state))
    }

    fn build_snapshot(&self, state: &StoreState) -> StoreSnapshot {
        let mut entries: Vec<SessionEntry> = state.sessions.values().cloned().collect();
        entries.sort_by(|a, b| {
            a.token
                .counter()
                .cmp(&b.token.counter())
                .then_with(|| a.token.cmp(&b.token))
        });
        StoreSnapshot {
            counter: self.tokens.current(),
            entries,
            generation: state.generation,
        }
    }

    fn schedule_snapshot(&self, snapshot: Option<StoreSnapshot>) {
        let (Some(snapshot), Some(gateway)) = (snapshot, self.persistence.clone()) else {
            return;
        };
        let reporter = self.reporter.clone();

        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = gateway.save(&snapshot).await {
                        reporter.report(&e);
                    }
                });
            }
            Err(_) => reporter.report(&InterludeError::persistence_write(
                "no tokio runtime available to write snapshot",
                Some(gateway.path().display().to_string()),
            )),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.len())
            .field("counter", &self.tokens.current())
            .field("continuations", &self.continuations)
            .field("persistence", &self.persistence)
            .finish()
    }
}
