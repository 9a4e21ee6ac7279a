//! Append-only record of unrecognized push events.
//!
//! Useful when the controller firmware grows new event types: every event
//! the client does not recognize is written as one line.

// ============================================================================
// Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// UnknownEventLog
// ============================================================================

/// File sink for unknown events.
#[derive(Debug)]
pub struct UnknownEventLog {
    path: PathBuf,
    /// Serializes appends from concurrent dispatches.
    write_lock: Mutex<()>,
}

impl UnknownEventLog {
    /// Creates a sink for `path`. An empty path means "no log".
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return None;
        }
        Some(Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the log file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line for `event`. The file is created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be opened or written.
    pub fn append(&self, event: &str, payload: &Value) -> Result<()> {
        let line = format!("Unknown event '{event}' received with data: {payload}\n");

        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_empty_path_disables_log() {
        assert!(UnknownEventLog::new("").is_none());
    }

    #[test]
    fn test_append_accumulates_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let log = UnknownEventLog::new(&path).unwrap();

        log.append("mystery", &json!([1, 2])).unwrap();
        log.append("other", &Value::Null).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Unknown event 'mystery' received with data: [1,2]",
                "Unknown event 'other' received with data: null",
            ]
        );
    }

    #[test]
    fn test_append_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = UnknownEventLog::new(dir.path().join("missing/events.log")).unwrap();
        assert!(log.append("mystery", &Value::Null).is_err());
    }
}
