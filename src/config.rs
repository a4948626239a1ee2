//! Relay configuration
//!
//! Defaults match the usual host render quantum. Every field can be
//! overridden through `RELAY_*` environment variables.

use crate::port::{MAX_BLOCK_SIZE, MAX_RING_SAMPLES};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{name} must not exceed {max}")]
    TooLarge { name: &'static str, max: usize },
}

/// Relay configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Frames per block handed to the processor
    pub block_size: usize,
    /// Number of blocks the ring can hold before dropping
    pub ring_blocks: usize,
    /// Interval at which the main thread drains the ring (ms)
    pub poll_interval_ms: u64,
    /// Input device name (`None` = system default)
    pub device: Option<String>,
    /// Where the recording is written on exit
    pub output: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            block_size: 128,
            ring_blocks: 256, // ~0.7s @ 48kHz
            poll_interval_ms: 10,
            device: None,
            output: PathBuf::from("recording.wav"),
        }
    }
}

impl RelayConfig {
    /// Load the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("RELAY_BLOCK_SIZE") {
            config.block_size = parse("RELAY_BLOCK_SIZE", &value)?;
        }
        if let Some(value) = lookup("RELAY_RING_BLOCKS") {
            config.ring_blocks = parse("RELAY_RING_BLOCKS", &value)?;
        }
        if let Some(value) = lookup("RELAY_POLL_MS") {
            config.poll_interval_ms = parse("RELAY_POLL_MS", &value)?;
        }
        if let Some(value) = lookup("RELAY_DEVICE") {
            let value = value.trim();
            if !value.is_empty() {
                config.device = Some(value.to_string());
            }
        }
        if let Some(value) = lookup("RELAY_OUTPUT") {
            config.output = PathBuf::from(value);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that sizes and intervals are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::Zero("block_size"));
        }
        if self.ring_blocks == 0 {
            return Err(ConfigError::Zero("ring_blocks"));
        }
        if self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::TooLarge {
                name: "block_size",
                max: MAX_BLOCK_SIZE,
            });
        }
        let ring_samples = self.block_size.checked_mul(self.ring_blocks);
        if ring_samples.map_or(true, |n| n > MAX_RING_SAMPLES) {
            return Err(ConfigError::TooLarge {
                name: "block_size * ring_blocks",
                max: MAX_RING_SAMPLES,
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("poll_interval_ms"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}
