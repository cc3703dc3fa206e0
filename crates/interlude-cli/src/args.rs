//! CLI argument definitions using clap
//!
//! - interlude inspect              # List entries in the snapshot
//! - interlude sweep                # Run one expiry pass and save
//! - interlude issue -o Yes -o No   # Start an interaction, print its buttons
//! - interlude resolve 1-0          # Deliver one button press
//! - interlude serve                # Dispatch payload lines from stdin

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "interlude.toml";

#[derive(Parser, Debug)]
#[command(name = "interlude")]
#[command(about = "Interlude - token store for pending chat interactions")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (JSON, TOML or YAML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Snapshot file to operate on (overrides the configuration)
    #[arg(long, global = true, env = "INTERLUDE_SNAPSHOT_PATH")]
    pub snapshot: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the interactions stored in the snapshot
    Inspect {
        /// Print the entries as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Evict expired interactions and save the result
    Sweep {
        /// Retention window to apply instead of the configured one (e.g. "2days")
        #[arg(long)]
        retention: Option<String>,
    },

    /// Start a new interaction and print its keyboard as JSON
    Issue {
        /// Option to offer, as `label` or `label=value` (repeatable)
        #[arg(long = "option", short = 'o', required = true)]
        options: Vec<String>,

        /// Continuation kind recorded with the interaction
        #[arg(long, default_value = "cli")]
        kind: String,

        /// Buttons per keyboard row
        #[arg(long, default_value_t = 1)]
        columns: usize,
    },

    /// Deliver a single `<token>-<index>` payload
    Resolve {
        /// Callback payload carried by the pressed button
        payload: String,

        /// Who pressed the button
        #[arg(long)]
        sender: Option<String>,
    },

    /// Read payloads from stdin, one per line, with the sweeper running
    Serve,
}
