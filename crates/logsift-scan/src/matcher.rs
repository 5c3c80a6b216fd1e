//! The matcher seam and the regex-backed implementation.

use logsift_core::MatchRecord;
use regex::bytes::Regex;

/// A pure per-line matching function.
///
/// Implementations are shared across worker tasks and may be invoked
/// concurrently in any order, so they must not keep state between lines.
/// Returning `None` means "no match, discard the line"; a returned record
/// with [`MatchRecord::error`] set reports a per-line matcher failure
/// without stopping the scan.
pub trait LineMatcher: Send + Sync {
    /// Inspect one line (terminator already stripped).
    fn match_line(&self, line: &[u8]) -> Option<MatchRecord>;
}

impl<F> LineMatcher for F
where
    F: Fn(&[u8]) -> Option<MatchRecord> + Send + Sync,
{
    fn match_line(&self, line: &[u8]) -> Option<MatchRecord> {
        self(line)
    }
}

/// Matcher applying a compiled regular expression to raw line bytes.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Compile `pattern`. The regex runs on bytes, so lines that are not
    /// valid UTF-8 are still searched rather than aborting the scan.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// The source pattern this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl LineMatcher for RegexMatcher {
    fn match_line(&self, line: &[u8]) -> Option<MatchRecord> {
        if !self.regex.is_match(line) {
            return None;
        }
        match std::str::from_utf8(line) {
            Ok(text) => Some(MatchRecord::new(text)),
            Err(_) => Some(MatchRecord::with_error(
                String::from_utf8_lossy(line),
                "line is not valid utf-8",
            )),
        }
    }
}
