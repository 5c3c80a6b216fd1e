//! Error types for scanning and state persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate a scan.
///
/// Cancellation is not represented here: a cancelled scan is a clean partial
/// stop reported through [`crate::ScanStatus::Cancelled`].
#[derive(Debug, Error)]
pub enum ScanError {
    /// The underlying stream failed while reading.
    ///
    /// `offset` is the number of bytes accounted for before the failure; it
    /// is diagnostic context only and must not be persisted as a resume
    /// offset.
    #[error("read failed after {offset} bytes: {source}")]
    Read {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// A line exceeded the configured maximum length.
    #[error("line exceeds {limit} bytes (at offset {offset})")]
    LineTooLong { limit: usize, offset: u64 },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A scan task stopped without reporting (panic or runtime shutdown).
    #[error("scan task failed: {message}")]
    TaskFailed { message: String },
}

impl ScanError {
    /// Create a read error with offset context.
    pub fn read(offset: u64, source: std::io::Error) -> Self {
        Self::Read { offset, source }
    }

    /// Create an invalid-configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Errors reading or writing a resume state file.
#[derive(Debug, Error)]
pub enum StateError {
    /// State file exists but could not be read.
    #[error("couldn't read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// State file contents are not valid state JSON.
    #[error("couldn't parse state file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// State file could not be written.
    #[error("couldn't write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
