//! Scan configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default maximum accepted line length (32 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 32 * 1024 * 1024;

/// Default capacity of the line queue between the producer and the workers.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Configuration for a single scan.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Number of worker tasks applying the matcher (0 = one per core).
    #[builder(default = "0")]
    #[serde(default)]
    pub workers: usize,

    /// Longest accepted line, in bytes. A longer line aborts the scan.
    #[builder(default = "DEFAULT_MAX_LINE_BYTES")]
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,

    /// Capacity of the bounded line queue feeding the workers.
    #[builder(default = "DEFAULT_QUEUE_CAPACITY")]
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.max_line_bytes {
            return Err("max_line_bytes must be greater than zero".to_string());
        }
        if let Some(0) = self.queue_capacity {
            return Err("queue_capacity must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config with the default limits.
    pub fn new() -> Self {
        Self {
            workers: 0,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .workers(4usize)
            .max_line_bytes(1024usize)
            .build()
            .unwrap();

        assert_eq!(config.workers, 4);
        assert_eq!(config.max_line_bytes, 1024);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_config_defaults() {
        let config = ScanConfig::new();
        assert_eq!(config.workers, 0);
        assert_eq!(config.max_line_bytes, DEFAULT_MAX_LINE_BYTES);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_config_rejects_zero_limits() {
        assert!(ScanConfig::builder().max_line_bytes(0usize).build().is_err());
        assert!(ScanConfig::builder().queue_capacity(0usize).build().is_err());
    }

    #[test]
    fn test_config_zero_workers_is_auto() {
        // 0 is the auto-detect sentinel, not an invalid value.
        let config = ScanConfig::builder().workers(0usize).build().unwrap();
        assert_eq!(config.workers, 0);
    }
}
