//! Button presses flowing through the dispatcher

use interlude::{
    ChoiceKeyboard, ChoiceOption, ContinuationRegistry, DispatchOutcome, ErrorReporter,
    InboundEvent, InterludeError, NewSession, ResolutionDispatcher, ResumeAction, SessionStore,
    Token, UnifiedError, from_fn,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Keeps the error code of every reported fault
#[derive(Default)]
struct CollectingReporter {
    codes: Mutex<Vec<String>>,
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, error: &InterludeError) {
        self.codes.lock().push(error.error_code().to_string());
    }
}

impl CollectingReporter {
    fn codes(&self) -> Vec<String> {
        self.codes.lock().clone()
    }
}

fn setup() -> (
    Arc<SessionStore>,
    ResolutionDispatcher,
    Arc<CollectingReporter>,
    mpsc::UnboundedReceiver<(Token, usize)>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let registry = ContinuationRegistry::new().with_handler(
        "pick",
        from_fn(move |session| {
            tx.send((session.token.clone(), session.selection.unwrap_or(usize::MAX)))?;
            Ok(())
        }),
    );
    let reporter = Arc::new(CollectingReporter::default());
    let store = Arc::new(
        SessionStore::new()
            .with_continuations(registry)
            .with_reporter(reporter.clone()),
    );
    let dispatcher = ResolutionDispatcher::new(store.clone()).with_reporter(reporter.clone());
    (store, dispatcher, reporter, rx)
}

fn two_buttons() -> NewSession {
    NewSession::new(
        vec![ChoiceOption::new("Left"), ChoiceOption::new("Right")],
        ResumeAction::new("pick"),
    )
}

async fn press(dispatcher: &ResolutionDispatcher, payload: &str) -> DispatchOutcome {
    dispatcher
        .on_external_event(InboundEvent::new(payload))
        .unwrap()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_first_press_wins_second_is_rejected() {
    let (store, dispatcher, reporter, mut rx) = setup();
    let token = store.create(two_buttons()).unwrap();
    assert_eq!(token.as_str(), "1");

    assert!(press(&dispatcher, "1-0").await.is_resolved());
    assert_eq!(rx.recv().await, Some((token.clone(), 0)));

    assert_eq!(
        press(&dispatcher, "1-1").await,
        DispatchOutcome::AlreadyResolved {
            token: token.clone(),
            selection: 0
        }
    );
    assert!(rx.try_recv().is_err());
    assert_eq!(store.get("1").unwrap().selection, Some(0));
    assert_eq!(reporter.codes(), vec!["INTERLUDE_ALREADY_RESOLVED"]);
}

#[tokio::test]
async fn test_keyboard_payloads_drive_resolution() {
    let (store, dispatcher, _reporter, mut rx) = setup();
    let token = store.create(two_buttons()).unwrap();
    let session = store.get(token.as_str()).unwrap();
    let keyboard = ChoiceKeyboard::for_session(&session);

    let right = keyboard.buttons().nth(1).unwrap();
    assert_eq!(right.label, "Right");
    assert!(press(&dispatcher, &right.callback_data).await.is_resolved());
    assert_eq!(rx.recv().await, Some((token, 1)));
}

#[tokio::test]
async fn test_noise_never_touches_the_store() {
    let (store, dispatcher, reporter, mut rx) = setup();
    store.create(two_buttons()).unwrap();

    assert_eq!(
        dispatcher.dispatch(InboundEvent::empty()).await,
        DispatchOutcome::Ignored
    );
    assert_eq!(press(&dispatcher, "garbage").await, DispatchOutcome::Malformed);
    assert_eq!(press(&dispatcher, "1-two").await, DispatchOutcome::Malformed);
    assert!(matches!(
        press(&dispatcher, "nonexistent-0").await,
        DispatchOutcome::UnknownToken { .. }
    ));
    assert!(matches!(
        press(&dispatcher, "1-9").await,
        DispatchOutcome::InvalidSelection { index: 9, .. }
    ));

    assert_eq!(store.len(), 1);
    assert!(!store.get("1").unwrap().is_resolved());
    assert!(rx.try_recv().is_err());
    assert_eq!(
        reporter.codes(),
        vec![
            "INTERLUDE_MALFORMED_EVENT",
            "INTERLUDE_MALFORMED_EVENT",
            "INTERLUDE_UNKNOWN_TOKEN",
            "INTERLUDE_INVALID_SELECTION",
        ]
    );
}

#[tokio::test]
async fn test_swept_token_is_unknown() {
    let (store, dispatcher, _reporter, _rx) = setup();
    let token = store.create(two_buttons()).unwrap();
    assert_eq!(store.sweep_expired(std::time::Duration::ZERO), 1);

    assert_eq!(
        press(&dispatcher, "1-0").await,
        DispatchOutcome::UnknownToken { token }
    );
}
