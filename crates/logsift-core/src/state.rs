//! Persisted resume state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::StateError;

/// Resume position for a single log file, persisted between invocations.
///
/// Stored as a small JSON document (`{"offset": 1234}`). A missing state
/// file is a fresh state, not an error; a present-but-unreadable one is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    /// Byte offset into the log file where the next scan should begin.
    #[serde(default)]
    pub offset: u64,
}

impl ResumeState {
    /// Create a state at the given offset.
    pub fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// Load the state from `path`, defaulting to offset 0 when the file does
    /// not exist yet.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(StateError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        serde_json::from_slice(&contents).map_err(|err| StateError::Parse {
            path: path.to_path_buf(),
            source: err,
        })
    }

    /// Write the state to `path`, creating parent directories as needed.
    pub fn store(&self, path: &Path) -> Result<(), StateError> {
        let write_err = |source| StateError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        // ResumeState always serializes; treat a serializer failure as I/O.
        let contents = serde_json::to_vec(self)
            .map_err(|err| write_err(std::io::Error::other(err)))?;
        fs::write(path, contents).map_err(write_err)
    }
}
