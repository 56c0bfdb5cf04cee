//! Configuration management for Crosscast

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CrosscastError, Result};

/// Minimum cadence for the read/write workers.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How long each worker sleeps between cycles, as a human-readable
    /// duration ("15s", "2m"). Must be at least one second.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Maximum messages drained from each queue per write cycle. Absent
    /// means the whole queue is drained every cycle.
    #[serde(default)]
    pub rate_limit: Option<usize>,
}

fn default_poll_interval() -> String {
    "15s".to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            rate_limit: None,
        }
    }
}

impl SchedulerConfig {
    /// Parse the configured poll interval.
    pub fn poll_interval(&self) -> Result<Duration> {
        humantime::parse_duration(&self.poll_interval).map_err(|e| {
            CrosscastError::InvalidInput(format!(
                "Could not parse poll interval '{}': {}",
                self.poll_interval, e
            ))
        })
    }

    /// Enforce the construction-time bounds: a sub-second cadence or a
    /// zero rate limit are configuration mistakes, not requests.
    pub fn validate(&self) -> Result<()> {
        let interval = self.poll_interval()?;
        if interval < MIN_POLL_INTERVAL {
            return Err(ConfigError::PollIntervalTooShort(interval).into());
        }

        if self.rate_limit == Some(0) {
            return Err(ConfigError::RateLimitTooLow.into());
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CROSSCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("crosscast").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.scheduler.poll_interval().unwrap(),
            Duration::from_secs(15)
        );
        assert_eq!(config.scheduler.rate_limit, None);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[scheduler]
poll_interval = "30s"
rate_limit = 5
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();

        assert_eq!(
            config.scheduler.poll_interval().unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(config.scheduler.rate_limit, Some(5));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load_from_path(Path::new("/nonexistent/crosscast.toml"));
        assert!(matches!(
            result,
            Err(CrosscastError::Config(ConfigError::ReadError(_)))
        ));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scheduler = nonsense").unwrap();

        let result = Config::load_from_path(&path);
        assert!(matches!(
            result,
            Err(CrosscastError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_unparseable_interval() {
        let scheduler = SchedulerConfig {
            poll_interval: "soonish".to_string(),
            rate_limit: None,
        };

        assert!(matches!(
            scheduler.validate(),
            Err(CrosscastError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sub_second_interval_rejected() {
        let scheduler = SchedulerConfig {
            poll_interval: "100ms".to_string(),
            rate_limit: None,
        };

        assert!(matches!(
            scheduler.validate(),
            Err(CrosscastError::Config(ConfigError::PollIntervalTooShort(_)))
        ));
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let scheduler = SchedulerConfig {
            poll_interval: "15s".to_string(),
            rate_limit: Some(0),
        };

        assert!(matches!(
            scheduler.validate(),
            Err(CrosscastError::Config(ConfigError::RateLimitTooLow))
        ));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_env_override() {
        std::env::set_var("CROSSCAST_CONFIG", "/tmp/crosscast-test.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("CROSSCAST_CONFIG");

        assert_eq!(path, PathBuf::from("/tmp/crosscast-test.toml"));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_default() {
        std::env::remove_var("CROSSCAST_CONFIG");
        let path = resolve_config_path().unwrap();

        assert!(path.ends_with("crosscast/config.toml"));
    }
}
