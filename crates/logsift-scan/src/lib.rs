//! Line scanning engine for logsift.
//!
//! This crate turns a byte stream into lines and fans them out to a pool of
//! worker tasks applying a caller-supplied matcher, while keeping an exact
//! account of how many bytes have been fully processed so the caller can
//! persist a resume offset.
//!
//! # Overview
//!
//! A scan is one producer task and N workers connected by a bounded queue:
//!
//! - **Producer** reads the stream, splits it into owned lines, and advances
//!   the consumed byte count in lockstep with lines actually handed to the
//!   queue. Read-ahead still sitting in the scan buffer is never counted, so
//!   a resume offset taken from a cancelled scan cannot skip unscanned data.
//! - **Workers** apply the matcher in parallel and forward non-empty
//!   records; result order across workers is unspecified.
//! - **Cancellation** via [`tokio_util::sync::CancellationToken`] stops all
//!   tasks at their next suspension point. A cancelled scan is a clean
//!   partial stop, not a failure, and its byte count is safe to persist.
//!
//! # Example
//!
//! ```rust,no_run
//! use logsift_scan::{LineScanner, RegexMatcher, ScanConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let file = tokio::fs::File::open("/var/log/app.log").await?;
//! let matcher = RegexMatcher::new("ERROR")?;
//! let scanner = LineScanner::with_config(file, matcher, ScanConfig::default());
//!
//! let mut handle = scanner.start(CancellationToken::new());
//! while let Some(record) = handle.recv().await {
//!     println!("{}", record.matched);
//! }
//!
//! let summary = handle.finish().await?;
//! println!("consumed {} bytes", summary.bytes_consumed);
//! # Ok(())
//! # }
//! ```

mod counter;
mod matcher;
mod producer;
mod scanner;
mod worker;

pub use counter::CountingSink;
pub use matcher::{LineMatcher, RegexMatcher};
pub use scanner::{LineScanner, ScanHandle};

// Re-export core types for convenience
pub use logsift_core::{MatchRecord, ScanConfig, ScanError, ScanStatus, ScanSummary};

/// Buffer size of the result channel between the workers and the caller.
pub const RESULT_CHANNEL_SIZE: usize = 100;
