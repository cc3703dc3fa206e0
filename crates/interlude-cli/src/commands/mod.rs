//! CLI commands

pub mod inspect;
pub mod issue;
pub mod resolve;
pub mod serve;
pub mod sweep;

use crate::console::CliConsole;
use colored::Colorize;
use interlude_core::{ChoiceOption, ContinuationRegistry, DispatchOutcome, SessionEntry, from_fn};
use tokio::sync::mpsc;

/// Registry whose fallback forwards every resolved session to `tx`
///
/// The CLI has no application continuations of its own; it only reports
/// what was picked.
pub fn reporting_registry(tx: mpsc::UnboundedSender<SessionEntry>) -> ContinuationRegistry {
    ContinuationRegistry::new().with_fallback(from_fn(move |session| {
        tx.send(session.clone())
            .map_err(|_| anyhow::anyhow!("resolution report channel closed"))
    }))
}

/// `label` or `label=value`
pub fn parse_option(raw: &str) -> ChoiceOption {
    match raw.split_once('=') {
        Some((label, value)) => ChoiceOption::with_value(label.trim(), value.trim()),
        None => ChoiceOption::new(raw.trim()),
    }
}

pub fn print_outcome(console: &CliConsole, outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Resolved { token, selection } => {
            console.success(&format!("Token {} resolved with option {}", token, selection))
        }
        DispatchOutcome::Ignored => console.info("Event without payload ignored"),
        DispatchOutcome::Malformed => console.warn("Malformed payload"),
        DispatchOutcome::UnknownToken { token } => {
            console.warn(&format!("Unknown or expired token {}", token))
        }
        DispatchOutcome::AlreadyResolved { token, selection } => console.warn(&format!(
            "Token {} was already resolved with option {}",
            token, selection
        )),
        DispatchOutcome::InvalidSelection { token, index } => {
            console.warn(&format!("Option {} does not exist for token {}", index, token))
        }
        DispatchOutcome::Failed => console.error("Resolution failed"),
    }
}

pub fn print_resolved(session: &SessionEntry) {
    let choice = session
        .selected_option()
        .map(|o| format!("{} ({})", o.label, o.value))
        .unwrap_or_else(|| "?".to_string());
    println!(
        "  {} {} {} {}",
        "→".cyan(),
        session.token.as_str().bold(),
        "picked".dimmed(),
        choice
    );
}
