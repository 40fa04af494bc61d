//! Append-only, GUID-tagged error log
//!
//! Every rejected file gets one line here. The GUID is generated fresh per
//! entry, independent of the message, so a support ticket can reference a
//! specific rejection unambiguously. Entries are never rewritten or rotated;
//! log growth is managed externally.

use chrono::Local;
use helix_common::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// Writer for the append-only error log
///
/// Line format:
/// `[YYYY-MM-DD HH:MM:SS] GUID: <guid> | File: <filename> | Error: <message>`
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    path: PathBuf,
}

impl ErrorReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry and return its GUID
    pub fn log(&self, filename: &str, message: &str) -> Result<Uuid> {
        let guid = Uuid::new_v4();
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!(
            "[{}] GUID: {} | File: {} | Error: {}\n",
            timestamp, guid, filename, message
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        debug!(%guid, filename, "Logged error report entry");
        Ok(guid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_log_appends_formatted_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("error_report.log");
        let reporter = ErrorReporter::new(&path);

        let guid = reporter
            .log("BADNAME.CSV", "Invalid filename pattern")
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        let line = content.lines().next().unwrap();
        assert!(line.contains(&format!("GUID: {}", guid)));
        assert!(line.contains("| File: BADNAME.CSV |"));
        assert!(line.ends_with("Error: Invalid filename pattern"));
    }

    #[test]
    fn test_entries_accumulate_with_unique_guids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("error_report.log");
        let reporter = ErrorReporter::new(&path);

        let first = reporter.log("A.CSV", "one").unwrap();
        let second = reporter.log("B.CSV", "two").unwrap();
        assert_ne!(first, second);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
