//! Configuration for the store, sweeper and logging

mod loader;
mod model;

pub use loader::{
    ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_RESOLVED_RETENTION, ENV_RETENTION, ENV_SNAPSHOT_PATH,
    ENV_SWEEP_INTERVAL, apply_env_overrides, apply_overrides_from, load_config, load_from_file,
    parse_duration,
};
pub use model::{
    DEFAULT_RETENTION, DEFAULT_SNAPSHOT_FILE, DEFAULT_SWEEP_INTERVAL, InterludeConfig,
    LoggingConfig, SweepConfig, default_snapshot_path,
};
