use crate::core::errors::{LifeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Simulation configuration with all tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // Board configuration
    /// Board width in cells
    pub width: usize,
    /// Board height in cells
    pub height: usize,
    /// Number of turns to simulate
    pub turns: usize,

    // Worker pool configuration
    /// Number of long-lived workers spawned before the first turn
    pub threads: usize,
    /// Buffer size of the shared idle and result channels. Each worker's
    /// assignment channel always holds a single cell.
    pub channel_capacity: usize,

    // Reporting
    /// Interval between alive-cell status reports
    pub status_interval: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let threads = num_cpus::get().max(1);

        Self {
            width: 512,
            height: 512,
            turns: 100,
            threads,
            channel_capacity: default_channel_capacity(threads),
            status_interval: Duration::from_secs(2),
        }
    }
}

/// Half the worker count, never less than one slot
pub fn default_channel_capacity(threads: usize) -> usize {
    (threads / 2).max(1)
}

impl SimulationConfig {
    /// Create a new builder for SimulationConfig
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::new()
    }

    /// Total number of cells on the board
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(LifeError::configuration_field(
                "width must be greater than 0",
                "width",
            ));
        }
        if self.height == 0 {
            return Err(LifeError::configuration_field(
                "height must be greater than 0",
                "height",
            ));
        }
        if self.width.checked_mul(self.height).is_none() {
            return Err(LifeError::configuration(
                "width * height overflows the address space",
            ));
        }
        if self.threads == 0 {
            return Err(LifeError::configuration_field(
                "threads must be greater than 0",
                "threads",
            ));
        }
        if self.channel_capacity == 0 {
            return Err(LifeError::configuration_field(
                "channel_capacity must be greater than 0",
                "channel_capacity",
            ));
        }
        if self.status_interval.is_zero() {
            return Err(LifeError::configuration_field(
                "status_interval must be non-zero",
                "status_interval",
            ));
        }
        Ok(())
    }

    /// Parse a configuration from YAML, filling unspecified fields with defaults.
    ///
    /// A missing `channel_capacity` follows the `threads` value of the file.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        SimulationConfigBuilder::from_yaml_str(yaml)?.build()
    }

    /// Load a configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        SimulationConfigBuilder::from_yaml_file(path)?.build()
    }

    /// Small board, few workers, fast status reports
    pub fn development() -> Self {
        Self {
            width: 16,
            height: 16,
            turns: 10,
            threads: 4,
            channel_capacity: default_channel_capacity(4),
            status_interval: Duration::from_millis(500),
        }
    }
}

/// Builder for SimulationConfig
pub struct SimulationConfigBuilder {
    config: SimulationConfig,
    channel_capacity_set: bool,
}

impl SimulationConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: SimulationConfig::default(),
            channel_capacity_set: false,
        }
    }

    /// Start from the development preset; capacity still follows `threads`
    pub fn development() -> Self {
        Self {
            config: SimulationConfig::development(),
            channel_capacity_set: false,
        }
    }

    /// Start from YAML. Fields the document omits keep their defaults, and
    /// the channel capacity counts as set only if the document names it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if value.is_null() {
            return Ok(Self::new());
        }
        let channel_capacity_set = value.get("channel_capacity").is_some();
        let config: SimulationConfig = serde_yaml::from_value(value)?;
        Ok(Self {
            config,
            channel_capacity_set,
        })
    }

    /// Start from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LifeError::io_with_source("read_config", e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Set board dimensions
    pub fn dimensions(mut self, width: usize, height: usize) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn width(mut self, width: usize) -> Self {
        self.config.width = width;
        self
    }

    pub fn height(mut self, height: usize) -> Self {
        self.config.height = height;
        self
    }

    /// Set the number of turns
    pub fn turns(mut self, turns: usize) -> Self {
        self.config.turns = turns;
        self
    }

    /// Set the worker count
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    /// Set the channel buffer size explicitly
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self.channel_capacity_set = true;
        self
    }

    /// Set the status report interval
    pub fn status_interval(mut self, interval: Duration) -> Self {
        self.config.status_interval = interval;
        self
    }

    /// Build and validate the configuration
    pub fn build(mut self) -> Result<SimulationConfig> {
        if !self.channel_capacity_set {
            self.config.channel_capacity = default_channel_capacity(self.config.threads);
        }
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SimulationConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.status_interval, Duration::from_secs(2));
        assert!(config.threads >= 1);
    }

    #[test]
    fn test_development_config() {
        let config = SimulationConfig::development();
        assert!(config.validate().is_ok());
        assert_eq!(config.threads, 4);
        assert_eq!(config.channel_capacity, 2);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = SimulationConfig::development();

        config.width = 0;
        assert!(config.validate().is_err());
        config.width = 16;

        config.threads = 0;
        assert!(config.validate().is_err());
        config.threads = 4;

        config.status_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.status_interval = Duration::from_secs(1);

        config.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = SimulationConfig::builder()
            .dimensions(64, 32)
            .turns(7)
            .threads(8)
            .status_interval(Duration::from_millis(250))
            .build()
            .unwrap();

        assert_eq!(config.width, 64);
        assert_eq!(config.height, 32);
        assert_eq!(config.turns, 7);
        assert_eq!(config.threads, 8);
        assert_eq!(config.channel_capacity, 4);
        assert_eq!(config.cell_count(), 64 * 32);
    }

    #[test]
    fn test_builder_single_worker_capacity() {
        let config = SimulationConfig::builder().threads(1).build().unwrap();
        assert_eq!(config.channel_capacity, 1);
    }

    #[test]
    fn test_yaml_partial_config() {
        let config = SimulationConfig::from_yaml_str("width: 16\nheight: 16\nturns: 3\nthreads: 2\nchannel_capacity: 1\n")
            .unwrap();
        assert_eq!(config.width, 16);
        assert_eq!(config.turns, 3);
        assert_eq!(config.status_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_yaml_capacity_follows_threads() {
        let config = SimulationConfig::from_yaml_str("threads: 6\n").unwrap();
        assert_eq!(config.channel_capacity, 3);

        let config = SimulationConfigBuilder::from_yaml_str("width: 16\nheight: 16\nthreads: 2\n")
            .unwrap()
            .threads(8)
            .build()
            .unwrap();
        assert_eq!(config.threads, 8);
        assert_eq!(config.channel_capacity, 4);
    }

    #[test]
    fn test_yaml_explicit_capacity_survives_thread_override() {
        let config = SimulationConfigBuilder::from_yaml_str("threads: 2\nchannel_capacity: 5\n")
            .unwrap()
            .threads(8)
            .build()
            .unwrap();
        assert_eq!(config.channel_capacity, 5);
    }

    #[test]
    fn test_yaml_single_dimension_override() {
        let config = SimulationConfigBuilder::from_yaml_str("width: 16\nheight: 24\n")
            .unwrap()
            .width(64)
            .build()
            .unwrap();
        assert_eq!((config.width, config.height), (64, 24));
    }

    #[test]
    fn test_development_builder_capacity_follows_threads() {
        let config = SimulationConfigBuilder::development().threads(10).build().unwrap();
        assert_eq!((config.width, config.height), (16, 16));
        assert_eq!(config.channel_capacity, 5);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = SimulationConfig::from_yaml_str("").unwrap();
        assert_eq!(config.width, 512);
        assert_eq!(config.channel_capacity, default_channel_capacity(config.threads));
    }

    #[test]
    fn test_yaml_rejects_invalid() {
        let err = SimulationConfig::from_yaml_str("width: 0\n").unwrap_err();
        assert_eq!(err.category(), "configuration");
    }
}
