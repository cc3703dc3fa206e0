//! Inspect command

use crate::console::CliConsole;
use chrono::{Duration, Utc};
use colored::Colorize;
use interlude_core::error::InterludeResult;
use interlude_core::{InterludeConfig, PersistenceGateway, SessionEntry, SessionState};

/// Print the contents of the snapshot without modifying it
pub async fn execute(config: &InterludeConfig, json: bool, console: CliConsole) -> InterludeResult<()> {
    let gateway = PersistenceGateway::new(&config.snapshot_path);
    let Some(snapshot) = gateway.try_load().await? else {
        console.warn(&format!(
            "No snapshot at {}",
            config.snapshot_path.display()
        ));
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.entries)?);
        return Ok(());
    }

    console.print_header(&format!("Snapshot {}", config.snapshot_path.display()));
    println!(
        "{} {}   {} {}",
        "counter:".dimmed(),
        snapshot.counter,
        "entries:".dimmed(),
        snapshot.entries.len()
    );
    println!();

    if snapshot.is_empty() {
        println!("{}", "No pending interactions.".yellow());
        return Ok(());
    }

    let now = Utc::now();
    for entry in &snapshot.entries {
        let expired = entry.is_expired(now, config.sweep.retention);
        println!(
            "{:>8}  {:>10}  {:<9} {}",
            entry.token.as_str().bold(),
            format_age(now - entry.created_at),
            state_label(entry, expired),
            describe_options(entry)
        );
    }
    Ok(())
}

fn state_label(entry: &SessionEntry, expired: bool) -> String {
    if expired {
        return "expired".red().to_string();
    }
    match entry.state() {
        SessionState::Issued => "issued".yellow().to_string(),
        SessionState::Resolved => "resolved".green().to_string(),
    }
}

fn describe_options(entry: &SessionEntry) -> String {
    entry
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            if entry.selection == Some(index) {
                format!("[{}]", option.label).bold().to_string()
            } else {
                option.label.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Compact age such as "3d 4h", "2h 5m" or "42s"
fn format_age(age: Duration) -> String {
    let secs = age.num_seconds().max(0);
    let (days, hours, minutes) = (secs / 86_400, (secs % 86_400) / 3600, (secs % 3600) / 60);

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", secs)
    }
}
