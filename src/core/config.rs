//! Configuration for the statrank engine.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Programmatic builder overrides
//! - Validation and defaults

use crate::core::{Result, StatError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete configuration for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Computation engine configuration.
    pub engine: EngineConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Computation engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Subject count below which aggregation runs sequentially.
    pub threshold: usize,
    /// Maximum recursion depth when resolving derived metrics.
    pub max_depth: usize,
    /// Default leaderboard length for top-N requests.
    pub default_top_size: usize,
    /// Limit each requester to one in-flight computation.
    pub single_flight: bool,
    /// Poll interval while draining in-flight work before a reload.
    #[serde(with = "humantime_serde")]
    pub quiesce_poll: Duration,
    /// Maximum time to wait for in-flight work to drain.
    #[serde(with = "humantime_serde")]
    pub quiesce_timeout: Duration,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,
}

/// Log levels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            threshold: 1000,
            max_depth: 10,
            default_top_size: 10,
            single_flight: true,
            quiesce_poll: Duration::from_millis(25),
            quiesce_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Create new config with defaults.
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.engine.threshold == 0 {
            return Err(StatError::config("threshold must be greater than 0"));
        }
        if self.engine.max_depth == 0 {
            return Err(StatError::config("max_depth must be greater than 0"));
        }
        if self.engine.default_top_size == 0 {
            return Err(StatError::config("default_top_size must be greater than 0"));
        }
        if self.engine.quiesce_poll.is_zero() {
            return Err(StatError::config("quiesce_poll must be non-zero"));
        }
        if self.engine.quiesce_timeout < self.engine.quiesce_poll {
            return Err(StatError::config(format!(
                "quiesce_timeout ({:?}) must be at least quiesce_poll ({:?})",
                self.engine.quiesce_timeout, self.engine.quiesce_poll
            )));
        }
        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Initialize the global tracing subscriber from logging config.
///
/// `RUST_LOG` takes precedence over the configured level. Safe to call more
/// than once; later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Configuration builder for programmatic construction.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| StatError::config(format!("failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set the sequential-aggregation threshold.
    pub fn threshold(mut self, threshold: usize) -> Self {
        self.config.engine.threshold = threshold;
        self
    }

    /// Set the maximum derived-metric recursion depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.engine.max_depth = depth;
        self
    }

    /// Set the default leaderboard length.
    pub fn default_top_size(mut self, size: usize) -> Self {
        self.config.engine.default_top_size = size;
        self
    }

    /// Enable or disable single-flight admission control.
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.config.engine.single_flight = enabled;
        self
    }

    /// Set the quiesce timeout used before catalog reloads.
    pub fn quiesce_timeout(mut self, timeout: Duration) -> Self {
        self.config.engine.quiesce_timeout = timeout;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.threshold, 1000);
        assert_eq!(config.engine.max_depth, 10);
        assert!(config.engine.single_flight);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut config = Config::default();
        config.engine.threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .threshold(500)
            .max_depth(4)
            .default_top_size(25)
            .single_flight(false)
            .build()
            .unwrap();

        assert_eq!(config.engine.threshold, 500);
        assert_eq!(config.engine.max_depth, 4);
        assert_eq!(config.engine.default_top_size, 25);
        assert!(!config.engine.single_flight);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
engine:
  threshold: 250
  max_depth: 6
  default_top_size: 5
  single_flight: false
  quiesce_poll: 10ms
  quiesce_timeout: 5s
logging:
  level: debug
"#;

        let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();
        assert_eq!(config.engine.threshold, 250);
        assert_eq!(config.engine.max_depth, 6);
        assert_eq!(config.engine.default_top_size, 5);
        assert!(!config.engine.single_flight);
        assert_eq!(config.engine.quiesce_timeout, Duration::from_secs(5));
        assert_eq!(config.logging.level.as_str(), "debug");
    }

    #[test]
    fn test_quiesce_timeout_below_poll_rejected() {
        let mut config = Config::default();
        config.engine.quiesce_timeout = Duration::from_millis(1);
        assert!(config.validate().is_err());
    }
}
