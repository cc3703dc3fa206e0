//! Configuration model

use crate::error::{InterludeError, InterludeResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between expiry passes
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default age at which an entry is evicted
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default snapshot file name, under `~/.interlude/`
pub const DEFAULT_SNAPSHOT_FILE: &str = "callback_data.json";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterludeConfig {
    /// Where the store is snapshotted
    pub snapshot_path: PathBuf,
    pub sweep: SweepConfig,
    pub logging: LoggingConfig,
}

impl Default for InterludeConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            sweep: SweepConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl InterludeConfig {
    pub fn validate(&self) -> InterludeResult<()> {
        if self.snapshot_path.as_os_str().is_empty() {
            return Err(InterludeError::config("snapshot_path must not be empty"));
        }
        self.sweep.validate()?;
        self.logging.validate()
    }
}

/// Expiry sweeper settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Time between passes
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Entries at least this old are evicted, resolved or not
    #[serde(with = "humantime_serde")]
    pub retention: Duration,
    /// Resolved entries are evicted this long after their resolution
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub resolved_retention: Option<Duration>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            retention: DEFAULT_RETENTION,
            resolved_retention: None,
        }
    }
}

impl SweepConfig {
    pub fn new(interval: Duration, retention: Duration) -> Self {
        Self {
            interval,
            retention,
            resolved_retention: None,
        }
    }

    pub fn with_resolved_retention(mut self, retention: Duration) -> Self {
        self.resolved_retention = Some(retention);
        self
    }

    pub fn validate(&self) -> InterludeResult<()> {
        if self.interval.is_zero() {
            return Err(InterludeError::config_with_context(
                "sweep interval must be greater than zero",
                "sweep.interval",
            ));
        }
        if self.retention.is_zero() {
            return Err(InterludeError::config_with_context(
                "retention must be greater than zero",
                "sweep.retention",
            ));
        }
        if self.resolved_retention.is_some_and(|d| d.is_zero()) {
            return Err(InterludeError::config_with_context(
                "resolved retention must be greater than zero when set",
                "sweep.resolved_retention",
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> InterludeResult<()> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(InterludeError::config_with_context(
                    format!("unknown log level '{}'", other),
                    "logging.level",
                ));
            }
        }
        match self.format.as_str() {
            "json" | "pretty" | "compact" => Ok(()),
            other => Err(InterludeError::config_with_context(
                format!("unknown log format '{}'", other),
                "logging.format",
            )),
        }
    }
}

/// `~/.interlude/callback_data.json`, or a relative path when no home is known
pub fn default_snapshot_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".interlude"))
        .unwrap_or_else(|| PathBuf::from(".interlude"))
        .join(DEFAULT_SNAPSHOT_FILE)
}
