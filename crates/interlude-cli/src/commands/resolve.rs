//! Resolve command

use super::{print_outcome, print_resolved, reporting_registry};
use crate::console::CliConsole;
use interlude_core::error::InterludeResult;
use interlude_core::{CallbackService, InboundEvent, InterludeConfig, TracingReporter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// How long to wait for the continuation to report back
const CONTINUATION_WAIT: Duration = Duration::from_secs(5);

/// Deliver one payload against the snapshot
pub async fn execute(
    config: InterludeConfig,
    payload: &str,
    sender: Option<String>,
    console: CliConsole,
) -> InterludeResult<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let service =
        CallbackService::open(config, reporting_registry(tx), Arc::new(TracingReporter)).await;

    let mut event = InboundEvent::new(payload).with_event_id(Uuid::new_v4().to_string());
    if let Some(sender) = sender {
        event = event.with_sender(sender);
    }

    let outcome = service.dispatcher().dispatch(event).await;
    print_outcome(&console, &outcome);

    if outcome.is_resolved() {
        match tokio::time::timeout(CONTINUATION_WAIT, rx.recv()).await {
            Ok(Some(session)) => print_resolved(&session),
            _ => console.warn("Continuation did not report back"),
        }
    }

    service.shutdown().await
}
