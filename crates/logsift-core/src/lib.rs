//! Core types and traits for logsift.
//!
//! This crate provides the fundamental data structures shared by the scan
//! engine and the CLI: scan configuration, the error taxonomy, match
//! records, scan summaries, and the persisted resume state.

mod config;
mod error;
mod record;
mod state;
mod summary;

pub use config::{ScanConfig, ScanConfigBuilder, DEFAULT_MAX_LINE_BYTES, DEFAULT_QUEUE_CAPACITY};
pub use error::{ScanError, StateError};
pub use record::MatchRecord;
pub use state::ResumeState;
pub use summary::{ScanStatus, ScanSummary};
