//! Interlude CLI application
//!
//! Operator tooling over an Interlude snapshot file.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/interlude-cli
//! ```
//!
//! # Commands
//!
//! - `inspect`: list the interactions stored in the snapshot
//! - `sweep`: evict expired interactions once and save
//! - `issue`: start an interaction and print the buttons to show
//! - `resolve`: deliver one `<token>-<index>` payload
//! - `serve`: dispatch payload lines from stdin until EOF or Ctrl-C
//!
//! Configuration is read from `--config-file` (JSON, TOML or YAML), then
//! `INTERLUDE_*` environment variables, then `--snapshot`.

mod args;
mod commands;
mod console;
mod logging;
mod router;

use clap::Parser;
use args::Cli;
use interlude_core::error::InterludeResult;

#[tokio::main]
async fn main() -> InterludeResult<()> {
    let cli = Cli::parse();
    let config = router::load_cli_config(&cli)?;

    // Set RUST_LOG=debug for verbose logging
    logging::init(&config.logging, cli.verbose);

    router::route(cli, config).await
}
