//! Serve command
//!
//! Stands in for a messaging gateway: every non-blank stdin line is treated
//! as the payload of one button press.

use super::{print_outcome, print_resolved, reporting_registry};
use crate::console::CliConsole;
use interlude_core::error::InterludeResult;
use interlude_core::{CallbackService, InboundEvent, InterludeConfig, TracingReporter};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use uuid::Uuid;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn execute(config: InterludeConfig, console: CliConsole) -> InterludeResult<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut service =
        CallbackService::open(config, reporting_registry(tx), Arc::new(TracingReporter)).await;
    service.spawn_sweeper();

    let printer = tokio::spawn(async move {
        while let Some(session) = rx.recv().await {
            print_resolved(&session);
        }
    });

    console.info("Reading payloads from stdin (Ctrl-C to stop)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut workers = Vec::new();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let payload = line.trim();
                    if payload.is_empty() {
                        continue;
                    }
                    let event = InboundEvent::new(payload).with_event_id(Uuid::new_v4().to_string());
                    if let Some(handle) = service.on_external_event(event) {
                        workers.push(tokio::spawn(async move {
                            if let Ok(outcome) = handle.await {
                                print_outcome(&console, &outcome);
                            }
                        }));
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    console.error(&format!("Failed to read stdin: {}", e));
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                console.info("Interrupted");
                break;
            }
        }
    }

    for worker in workers {
        let _ = worker.await;
    }
    service.shutdown().await?;

    // The registry (and its sender) is gone once the service is dropped
    let _ = tokio::time::timeout(DRAIN_TIMEOUT, printer).await;
    Ok(())
}
