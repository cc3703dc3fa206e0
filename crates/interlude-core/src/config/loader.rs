//! File and environment configuration loading

use super::model::InterludeConfig;
use crate::error::{InterludeError, InterludeResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables consulted by [`apply_env_overrides`]
pub const ENV_SNAPSHOT_PATH: &str = "INTERLUDE_SNAPSHOT_PATH";
pub const ENV_SWEEP_INTERVAL: &str = "INTERLUDE_SWEEP_INTERVAL";
pub const ENV_RETENTION: &str = "INTERLUDE_RETENTION";
pub const ENV_RESOLVED_RETENTION: &str = "INTERLUDE_RESOLVED_RETENTION";
pub const ENV_LOG_LEVEL: &str = "INTERLUDE_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "INTERLUDE_LOG_FORMAT";

/// Load configuration from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// Returns default config if file doesn't exist.
pub fn load_from_file(path: &Path) -> InterludeResult<InterludeConfig> {
    if !path.exists() {
        return Ok(InterludeConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        InterludeError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config: InterludeConfig = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            InterludeError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
            InterludeError::config_with_context(
                format!("Failed to parse YAML config: {}", e),
                format!("Deserializing YAML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            InterludeError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}

/// Apply `INTERLUDE_*` overrides from the process environment
pub fn apply_env_overrides(config: &mut InterludeConfig) -> InterludeResult<()> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides using `lookup` to read each variable
pub fn apply_overrides_from<F>(config: &mut InterludeConfig, lookup: F) -> InterludeResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_SNAPSHOT_PATH) {
        config.snapshot_path = PathBuf::from(path);
    }

    if let Some(value) = lookup(ENV_SWEEP_INTERVAL) {
        config.sweep.interval = parse_duration(ENV_SWEEP_INTERVAL, &value)?;
    }

    if let Some(value) = lookup(ENV_RETENTION) {
        config.sweep.retention = parse_duration(ENV_RETENTION, &value)?;
    }

    if let Some(value) = lookup(ENV_RESOLVED_RETENTION) {
        // Empty or "off" disables the separate window
        config.sweep.resolved_retention = match value.trim() {
            "" | "off" | "none" => None,
            _ => Some(parse_duration(ENV_RESOLVED_RETENTION, &value)?),
        };
    }

    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }

    if let Some(format) = lookup(ENV_LOG_FORMAT) {
        config.logging.format = format;
    }

    Ok(())
}

/// File (or defaults), then environment, then validation
pub fn load_config(path: Option<&Path>) -> InterludeResult<InterludeConfig> {
    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => InterludeConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Parse a human-readable duration ("90s", "24h", "7days"); `key` names the
/// setting in the error
pub fn parse_duration(key: &str, value: &str) -> InterludeResult<Duration> {
    humantime_serde::re::humantime::parse_duration(value.trim()).map_err(|e| {
        InterludeError::config_with_context(
            format!("Invalid {} value '{}': {}", key, value, e),
            "Parsing duration setting",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_file_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_from_file(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, InterludeConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("interlude.toml");
        fs::write(
            &config_path,
            r#"
snapshot_path = "/var/lib/interlude/callbacks.json"

[sweep]
interval = "1h"
retention = "3days"

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.snapshot_path, PathBuf::from("/var/lib/interlude/callbacks.json"));
        assert_eq!(config.sweep.interval, Duration::from_secs(3600));
        assert_eq!(config.sweep.retention, Duration::from_secs(3 * 86_400));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("interlude.yaml");
        fs::write(
            &config_path,
            "sweep:\n  interval: 30m\n  resolved_retention: 1day\n",
        )
        .unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.sweep.interval, Duration::from_secs(1800));
        assert_eq!(config.sweep.resolved_retention, Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_load_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("interlude.json");
        fs::write(&config_path, r#"{"logging": {"level": "warn"}}"#).unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "compact");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.json");
        fs::write(&config_path, "{ not json").unwrap();

        let err = load_from_file(&config_path).unwrap_err();
        assert!(matches!(err, InterludeError::Config { context: Some(_), .. }));
    }

    #[test]
    fn test_overrides() {
        let mut config = InterludeConfig::default();
        let lookup = lookup_from(&[
            (ENV_SNAPSHOT_PATH, "/tmp/cb.json"),
            (ENV_SWEEP_INTERVAL, "15m"),
            (ENV_RETENTION, "1day"),
            (ENV_RESOLVED_RETENTION, "2h"),
            (ENV_LOG_FORMAT, "pretty"),
        ]);

        apply_overrides_from(&mut config, lookup).unwrap();
        assert_eq!(config.snapshot_path, PathBuf::from("/tmp/cb.json"));
        assert_eq!(config.sweep.interval, Duration::from_secs(900));
        assert_eq!(config.sweep.retention, Duration::from_secs(86_400));
        assert_eq!(config.sweep.resolved_retention, Some(Duration::from_secs(7200)));
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_resolved_retention_can_be_disabled() {
        let mut config = InterludeConfig::default();
        config.sweep.resolved_retention = Some(Duration::from_secs(60));

        apply_overrides_from(&mut config, lookup_from(&[(ENV_RESOLVED_RETENTION, "off")])).unwrap();
        assert!(config.sweep.resolved_retention.is_none());
    }

    #[test]
    fn test_invalid_duration_override() {
        let mut config = InterludeConfig::default();
        let err = apply_overrides_from(&mut config, lookup_from(&[(ENV_SWEEP_INTERVAL, "often")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_SWEEP_INTERVAL));
    }
}
