//! Configuration with YAML schema and validation.
//!
//! Mistakes are caught in three layers:
//! - serde rejects unknown keys and wrong types
//! - `validator` enforces ranges
//! - `validate_semantic` covers what ranges cannot express

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::Validate;

use crate::demos::io_sim::IoMode;
use crate::error::{LabError, LabResult};

/// Top-level lab configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LabConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Interrupt walkthrough settings.
    #[validate(nested)]
    #[serde(default)]
    pub interrupt: InterruptConfig,

    /// I/O simulator settings.
    #[validate(nested)]
    #[serde(default)]
    pub io: IoConfig,

    /// Diagnostics settings.
    #[validate(nested)]
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            interrupt: InterruptConfig::default(),
            io: IoConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl LabConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> LabResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> LabResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        config.validate_semantic()?;
        Ok(config)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> LabConfigBuilder {
        LabConfigBuilder::default()
    }

    fn validate_semantic(&self) -> LabResult<()> {
        let speed = self.io.speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(LabError::config(format!(
                "io.speed must be a positive number, got {speed}"
            )));
        }
        Ok(())
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct LabConfigBuilder {
    autoplay_interval_ms: Option<u64>,
    mode: Option<IoMode>,
    speed: Option<f64>,
    id_seed: Option<u64>,
    log_filter: Option<String>,
}

impl LabConfigBuilder {
    /// Set the auto-play interval in milliseconds.
    #[must_use]
    pub const fn autoplay_interval_ms(mut self, ms: u64) -> Self {
        self.autoplay_interval_ms = Some(ms);
        self
    }

    /// Set the I/O mode.
    #[must_use]
    pub const fn mode(mut self, mode: IoMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the speed multiplier.
    #[must_use]
    pub const fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Seed log-id generation.
    #[must_use]
    pub const fn id_seed(mut self, seed: u64) -> Self {
        self.id_seed = Some(seed);
        self
    }

    /// Set the default tracing filter.
    #[must_use]
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> LabConfig {
        let mut config = LabConfig::default();

        if let Some(ms) = self.autoplay_interval_ms {
            config.interrupt.autoplay_interval_ms = ms;
        }
        if let Some(mode) = self.mode {
            config.io.mode = mode;
        }
        if let Some(speed) = self.speed {
            config.io.speed = speed;
        }
        if self.id_seed.is_some() {
            config.io.id_seed = self.id_seed;
        }
        if let Some(filter) = self.log_filter {
            config.logging.filter = filter;
        }

        config
    }
}

/// Interrupt walkthrough settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct InterruptConfig {
    /// Auto-play interval in milliseconds.
    #[validate(range(min = 100, max = 60_000))]
    #[serde(default = "default_autoplay_interval_ms")]
    pub autoplay_interval_ms: u64,
}

const fn default_autoplay_interval_ms() -> u64 {
    3000
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: default_autoplay_interval_ms(),
        }
    }
}

impl InterruptConfig {
    /// Auto-play interval.
    #[must_use]
    pub const fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms)
    }
}

/// I/O simulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct IoConfig {
    /// Mode selected at start-up.
    #[serde(default)]
    pub mode: IoMode,

    /// Delay multiplier.
    #[validate(range(min = 0.1, max = 10.0))]
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Elapsed time that counts as 100 % progress, in milliseconds.
    #[validate(range(min = 1))]
    #[serde(default = "default_progress_horizon_ms")]
    pub progress_horizon_ms: u64,

    /// Seed for log ids. Unset means fresh ids every run.
    #[serde(default)]
    pub id_seed: Option<u64>,
}

const fn default_speed() -> f64 {
    1.0
}

const fn default_progress_horizon_ms() -> u64 {
    10_000
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            mode: IoMode::default(),
            speed: default_speed(),
            progress_horizon_ms: default_progress_horizon_ms(),
            id_seed: None,
        }
    }
}

impl IoConfig {
    /// Progress horizon.
    #[must_use]
    pub const fn progress_horizon(&self) -> Duration {
        Duration::from_millis(self.progress_horizon_ms)
    }
}

/// Diagnostics settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default `tracing` filter; `RUST_LOG` overrides it.
    #[validate(length(min = 1))]
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = LabConfig::default();

        assert_eq!(config.schema_version, "1.0");
        assert_eq!(config.interrupt.autoplay_interval(), Duration::from_millis(3000));
        assert_eq!(config.io.mode, IoMode::Polling);
        assert!((config.io.speed - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.io.progress_horizon(), Duration::from_secs(10));
        assert!(config.io.id_seed.is_none());
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_config_builder() {
        let config = LabConfig::builder()
            .autoplay_interval_ms(1500)
            .mode(IoMode::Dma)
            .speed(2.0)
            .id_seed(9)
            .log_filter("irqlab=debug")
            .build();

        assert_eq!(config.interrupt.autoplay_interval_ms, 1500);
        assert_eq!(config.io.mode, IoMode::Dma);
        assert!((config.io.speed - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.io.id_seed, Some(9));
        assert_eq!(config.logging.filter, "irqlab=debug");
    }

    #[test]
    fn test_config_yaml_parse() {
        let yaml = r"
interrupt:
  autoplay_interval_ms: 1000
io:
  mode: interrupt
  speed: 0.5
  id_seed: 42
";
        let config = LabConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.interrupt.autoplay_interval_ms, 1000);
        assert_eq!(config.io.mode, IoMode::Interrupt);
        assert!((config.io.speed - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.io.id_seed, Some(42));
        assert_eq!(config.io.progress_horizon_ms, 10_000);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = LabConfig::from_yaml("{}").unwrap();
        assert_eq!(config, LabConfig::default());
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let result = LabConfig::from_yaml("io:\n  turbo: true\n");
        assert!(matches!(result, Err(LabError::YamlParse(_))));
    }

    #[test]
    fn test_config_rejects_unknown_mode() {
        let result = LabConfig::from_yaml("io:\n  mode: fifo\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation_fails_fast_autoplay() {
        let result = LabConfig::from_yaml("interrupt:\n  autoplay_interval_ms: 10\n");
        assert!(matches!(result, Err(LabError::Validation(_))));
    }

    #[test]
    fn test_config_validation_fails_speed_out_of_range() {
        let result = LabConfig::from_yaml("io:\n  speed: 50.0\n");
        assert!(matches!(result, Err(LabError::Validation(_))));
    }

    #[test]
    fn test_config_semantic_rejects_nan_speed() {
        let mut config = LabConfig::default();
        config.io.speed = f64::NAN;
        assert!(config.validate_semantic().is_err());
    }

    #[test]
    fn test_config_load_missing_file() {
        let result = LabConfig::load("/nonexistent/irqlab.yaml");
        assert!(matches!(result, Err(LabError::Io(_))));
    }
}
