//! Match records emitted by the workers.

use serde::{Deserialize, Serialize};

/// A single matched line, as produced by a matcher.
///
/// `error` distinguishes "the matcher hit a problem on this line" from "no
/// match" (which is represented by emitting no record at all). A record with
/// `error` set does not stop the scan; other lines keep processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// The matched line.
    #[serde(rename = "match")]
    pub matched: String,

    /// Matcher failure for this line, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchRecord {
    /// Create a clean match record.
    pub fn new(matched: impl Into<String>) -> Self {
        Self {
            matched: matched.into(),
            error: None,
        }
    }

    /// Create a record carrying a per-line matcher failure.
    pub fn with_error(matched: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            matched: matched.into(),
            error: Some(error.into()),
        }
    }
}
