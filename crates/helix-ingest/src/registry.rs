//! Durable registry of successfully archived filenames
//!
//! The registry is the idempotency barrier: a filename present here is never
//! downloaded or validated again, by name alone (no content hashing). It is
//! persisted as a sorted, newline-delimited snapshot that is rewritten in
//! full on every successful addition; the snapshot survives a crash between
//! runs.
//!
//! Single-writer discipline is assumed: only the active worker mutates the
//! file, which the at-most-one-worker rule guarantees. Concurrent external
//! writers can corrupt the snapshot; that is a documented limitation.

use helix_common::Result;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

/// Set of filenames already archived, backed by a full-file snapshot
#[derive(Debug)]
pub struct ProcessedFileRegistry {
    path: PathBuf,
    entries: BTreeSet<String>,
}

impl ProcessedFileRegistry {
    /// Load the registry, reading the snapshot once if it exists
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            std::fs::read_to_string(&path)?
                .lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            BTreeSet::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "Loaded processed-file registry");
        Ok(Self { path, entries })
    }

    /// Whether a filename has already been archived
    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains(filename)
    }

    /// Record a filename and rewrite the snapshot
    ///
    /// A filename that is already present leaves the snapshot untouched.
    pub fn add(&mut self, filename: &str) -> Result<()> {
        if !self.entries.insert(filename.to_string()) {
            return Ok(());
        }
        self.persist()
    }

    /// Number of registered filenames
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let mut snapshot = self
            .entries
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        snapshot.push('\n');
        std::fs::write(&self.path, snapshot)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_snapshot_is_empty() {
        let dir = tempdir().unwrap();
        let registry = ProcessedFileRegistry::load(dir.path().join("processed_files.txt")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_persists_sorted_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed_files.txt");

        let mut registry = ProcessedFileRegistry::load(&path).unwrap();
        registry.add("CLINICALDATA20240201000000.CSV").unwrap();
        registry.add("CLINICALDATA20240101000000.CSV").unwrap();

        let snapshot = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            snapshot,
            "CLINICALDATA20240101000000.CSV\nCLINICALDATA20240201000000.CSV\n"
        );
    }

    #[test]
    fn test_reload_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed_files.txt");

        let mut registry = ProcessedFileRegistry::load(&path).unwrap();
        registry.add("CLINICALDATA20240101000000.CSV").unwrap();

        let reloaded = ProcessedFileRegistry::load(&path).unwrap();
        assert!(reloaded.contains("CLINICALDATA20240101000000.CSV"));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_re_add_is_a_no_op() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed_files.txt");

        let mut registry = ProcessedFileRegistry::load(&path).unwrap();
        registry.add("CLINICALDATA20240101000000.CSV").unwrap();
        registry.add("CLINICALDATA20240101000000.CSV").unwrap();

        assert_eq!(registry.len(), 1);
        let snapshot = std::fs::read_to_string(&path).unwrap();
        assert_eq!(snapshot.lines().count(), 1);
    }
}
