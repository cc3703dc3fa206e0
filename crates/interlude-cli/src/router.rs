//! Command routing logic for CLI

use crate::args::{Cli, Commands};
use crate::commands;
use crate::console::CliConsole;
use interlude_core::InterludeConfig;
use interlude_core::config::load_config;
use interlude_core::error::InterludeResult;

/// Configuration file, environment, then command-line overrides
pub fn load_cli_config(cli: &Cli) -> InterludeResult<InterludeConfig> {
    let mut config = load_config(Some(cli.config_file.as_path()))?;
    if let Some(snapshot) = &cli.snapshot {
        config.snapshot_path = snapshot.clone();
    }
    Ok(config)
}

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: InterludeConfig) -> InterludeResult<()> {
    let console = CliConsole::new(cli.verbose);
    tracing::debug!(command = ?cli.command, "Routing command");
    console.info(&format!("Using snapshot {}", config.snapshot_path.display()));

    match cli.command {
        Commands::Inspect { json } => commands::inspect::execute(&config, json, console).await,
        Commands::Sweep { retention } => {
            commands::sweep::execute(config, retention.as_deref(), console).await
        }
        Commands::Issue {
            options,
            kind,
            columns,
        } => commands::issue::execute(config, &options, &kind, columns).await,
        Commands::Resolve { payload, sender } => {
            commands::resolve::execute(config, &payload, sender, console).await
        }
        Commands::Serve => commands::serve::execute(config, console).await,
    }
}
