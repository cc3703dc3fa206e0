//! Turns inbound button presses into store resolutions
//!
//! The event source hands every event to [`ResolutionDispatcher::on_external_event`],
//! which returns straight away. Decoding and resolution happen on a worker
//! task; anything that goes wrong there ends up at the [`ErrorReporter`].

use crate::error::InterludeError;
use crate::event::InboundEvent;
use crate::reporter::{ErrorReporter, TracingReporter};
use crate::session::SessionStore;
use crate::token::{CallbackPayload, Token};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// What happened to one inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The event carried no payload
    Ignored,
    /// The payload was not `<token>-<index>`
    Malformed,
    /// No session under the token
    UnknownToken { token: Token },
    /// The session had already been resolved
    AlreadyResolved { token: Token, selection: usize },
    /// The index was out of range for the session
    InvalidSelection { token: Token, index: usize },
    /// Selection recorded and continuation started
    Resolved { token: Token, selection: usize },
    /// Resolution could not be attempted or blew up
    Failed,
}

impl DispatchOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, DispatchOutcome::Resolved { .. })
    }
}

/// Entry point for events from the messaging gateway
#[derive(Clone)]
pub struct ResolutionDispatcher {
    store: Arc<SessionStore>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ResolutionDispatcher {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Hand off `event` to a fresh worker and return immediately
    ///
    /// Returns `None` (after reporting) when called outside a tokio runtime.
    pub fn on_external_event(&self, event: InboundEvent) -> Option<JoinHandle<DispatchOutcome>> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                self.reporter.report(&InterludeError::runtime(
                    "inbound event delivered outside of a tokio runtime",
                ));
                return None;
            }
        };

        let dispatcher = self.clone();
        Some(runtime.spawn(async move { dispatcher.dispatch(event).await }))
    }

    /// Decode and resolve one event on the current task
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        let reporter = self.reporter.clone();
        match AssertUnwindSafe(async { self.resolve_event(event) })
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                reporter.report(&InterludeError::runtime("dispatcher worker panicked"));
                DispatchOutcome::Failed
            }
        }
    }

    fn resolve_event(&self, event: InboundEvent) -> DispatchOutcome {
        let Some(raw) = event.payload() else {
            debug!(event_id = ?event.event_id, "Ignoring event without payload");
            return DispatchOutcome::Ignored;
        };

        let payload = match CallbackPayload::parse(raw) {
            Ok(payload) => payload,
            Err(e) => {
                self.reporter.report(&e);
                return DispatchOutcome::Malformed;
            }
        };

        let CallbackPayload { token, selection } = payload;
        match self.store.resolve(token.as_str(), selection, event) {
            Ok(resolution) => DispatchOutcome::Resolved {
                token: resolution.session.token,
                selection,
            },
            Err(e) => {
                self.reporter.report(&e);
                match e {
                    InterludeError::UnknownToken { .. } => DispatchOutcome::UnknownToken { token },
                    InterludeError::AlreadyResolved { selection, .. } => {
                        DispatchOutcome::AlreadyResolved { token, selection }
                    }
                    InterludeError::InvalidSelection { index, .. } => {
                        DispatchOutcome::InvalidSelection { token, index }
                    }
                    _ => DispatchOutcome::Failed,
                }
            }
        }
    }
}

impl std::fmt::Debug for ResolutionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionDispatcher")
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::{ContinuationRegistry, ResumeAction, from_fn};
    use crate::reporter::MockErrorReporter;
    use crate::session::{ChoiceOption, NewSession};
    use tokio::sync::mpsc;

    fn yes_no() -> NewSession {
        NewSession::new(
            vec![ChoiceOption::new("Yes"), ChoiceOption::new("No")],
            ResumeAction::new("answer"),
        )
    }

    fn store_with_channel() -> (Arc<SessionStore>, mpsc::UnboundedReceiver<usize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = ContinuationRegistry::new().with_handler(
            "answer",
            from_fn(move |session| {
                tx.send(session.selection.unwrap_or(usize::MAX))?;
                Ok(())
            }),
        );
        (Arc::new(SessionStore::new().with_continuations(registry)), rx)
    }

    fn quiet_reporter() -> Arc<MockErrorReporter> {
        let mut reporter = MockErrorReporter::new();
        reporter.expect_report().return_const(());
        Arc::new(reporter)
    }

    #[tokio::test]
    async fn test_events_without_payload_are_ignored_silently() {
        let (store, _rx) = store_with_channel();
        // No expectations: any report fails the test
        let dispatcher =
            ResolutionDispatcher::new(store).with_reporter(Arc::new(MockErrorReporter::new()));

        assert_eq!(dispatcher.dispatch(InboundEvent::empty()).await, DispatchOutcome::Ignored);
        assert_eq!(dispatcher.dispatch(InboundEvent::new("   ")).await, DispatchOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_reported() {
        let (store, _rx) = store_with_channel();
        store.create(yes_no()).unwrap();

        let mut reporter = MockErrorReporter::new();
        reporter
            .expect_report()
            .withf(|e| matches!(e, InterludeError::MalformedEvent { .. }))
            .times(3)
            .return_const(());
        let dispatcher = ResolutionDispatcher::new(store.clone()).with_reporter(Arc::new(reporter));

        for raw in ["1", "1-x", "1-0-0"] {
            assert_eq!(dispatcher.dispatch(InboundEvent::new(raw)).await, DispatchOutcome::Malformed);
        }
        assert!(!store.get("1").unwrap().is_resolved());
    }

    #[tokio::test]
    async fn test_resolve_then_reject_second_press() {
        let (store, mut rx) = store_with_channel();
        let token = store.create(yes_no()).unwrap();
        assert_eq!(token.as_str(), "1");

        let mut reporter = MockErrorReporter::new();
        reporter
            .expect_report()
            .withf(|e| matches!(e, InterludeError::AlreadyResolved { selection: 0, .. }))
            .times(1)
            .return_const(());
        let dispatcher = ResolutionDispatcher::new(store.clone()).with_reporter(Arc::new(reporter));

        let first = dispatcher
            .on_external_event(InboundEvent::new("1-0"))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(
            first,
            DispatchOutcome::Resolved {
                token: token.clone(),
                selection: 0
            }
        );
        assert_eq!(rx.recv().await, Some(0));

        let second = dispatcher
            .on_external_event(InboundEvent::new("1-1"))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(
            second,
            DispatchOutcome::AlreadyResolved {
                token,
                selection: 0
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_token_and_bad_index_are_reported() {
        let (store, _rx) = store_with_channel();
        store.create(yes_no()).unwrap();
        let dispatcher = ResolutionDispatcher::new(store.clone()).with_reporter(quiet_reporter());

        assert_eq!(
            dispatcher.dispatch(InboundEvent::new("FF-0")).await,
            DispatchOutcome::UnknownToken {
                token: Token::from("FF")
            }
        );
        assert_eq!(
            dispatcher.dispatch(InboundEvent::new("1-5")).await,
            DispatchOutcome::InvalidSelection {
                token: Token::from("1"),
                index: 5
            }
        );
        assert_eq!(store.len(), 1);
        assert!(!store.get("1").unwrap().is_resolved());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_presses_resolve_exactly_once() {
        let (store, mut rx) = store_with_channel();
        store.create(yes_no()).unwrap();
        let dispatcher = ResolutionDispatcher::new(store.clone()).with_reporter(quiet_reporter());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                dispatcher
                    .on_external_event(InboundEvent::new(format!("1-{}", i % 2)))
                    .unwrap()
            })
            .collect();

        let mut resolved = 0;
        for handle in handles {
            if handle.await.unwrap().is_resolved() {
                resolved += 1;
            }
        }
        assert_eq!(resolved, 1);

        let selection = rx.recv().await.unwrap();
        assert_eq!(store.get("1").unwrap().selection, Some(selection));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_outside_runtime_is_reported() {
        let mut reporter = MockErrorReporter::new();
        reporter
            .expect_report()
            .withf(|e| matches!(e, InterludeError::Runtime { .. }))
            .times(1)
            .return_const(());
        let dispatcher = ResolutionDispatcher::new(Arc::new(SessionStore::new()))
            .with_reporter(Arc::new(reporter));

        assert!(dispatcher.on_external_event(InboundEvent::new("1-0")).is_none());
    }
}
