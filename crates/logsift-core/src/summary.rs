//! Terminal scan report types.

use serde::{Deserialize, Serialize};

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// The whole stream was read and split into lines.
    Completed,
    /// The scan stopped early on request. Not a failure: the consumed byte
    /// count still only covers fully delivered lines and is safe to persist,
    /// but it may be behind the end of the input.
    Cancelled,
}

/// Final accounting for a scan, readable only after every task has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// How the scan ended.
    pub status: ScanStatus,
    /// Bytes of input fully accounted for: the offset immediately after the
    /// last line handed to the work queue, terminator included. This is the
    /// value a caller adds to its resume offset.
    pub bytes_consumed: u64,
    /// Raw bytes pulled from the stream, including read-ahead that was never
    /// split into delivered lines. Diagnostic only; always >= `bytes_consumed`.
    pub bytes_read: u64,
    /// Number of lines handed to the work queue.
    pub lines_delivered: u64,
}

impl ScanSummary {
    /// True when the scan covered the entire input.
    pub fn is_complete(&self) -> bool {
        self.status == ScanStatus::Completed
    }
}
