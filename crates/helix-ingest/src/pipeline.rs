//! Ingestion pipeline: download, validate, archive or reject
//!
//! Runs the per-file state machine over a batch of remote files:
//!
//! ```text
//! Listed → Skipped                      (already in the registry)
//! Listed → Downloaded → FilenameRejected
//! Listed → Downloaded → ContentRejected
//! Listed → Downloaded → Archived
//! Listed → Downloaded → DownloadFailed
//! ```
//!
//! No per-file failure ever aborts the batch; every decision is emitted as a
//! [`StatusEvent`] and rejections are written to the error log. `validate`
//! mode is read-only diagnostics: originals are never moved and the registry
//! is never written.

use chrono::Local;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use helix_common::Result;

use crate::config::DirectoryLayout;
use crate::content::{ContentValidator, DefectCategory, RecordError, ValidationVerdict};
use crate::events::{emit, EventSink, StatusEvent};
use crate::filename;
use crate::registry::ProcessedFileRegistry;
use crate::report::ErrorReporter;

/// How many content errors are surfaced individually per rejected file
const REPORTED_ERROR_LIMIT: usize = 3;

/// Source of remote files: list names, stream one file into a sink
///
/// Implemented by [`crate::ftp::FtpGateway`]; tests substitute a local
/// directory-backed source.
pub trait RemoteSource {
    fn list(&mut self) -> Result<Vec<String>>;
    fn retrieve(&mut self, name: &str, sink: &mut dyn Write) -> Result<u64>;
}

/// Batch counters for `process` mode
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub archived: usize,
    pub rejected: usize,
    pub skipped: usize,
}

/// Batch counters for `validate` mode
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidateSummary {
    pub valid: usize,
    pub invalid: usize,
    pub skipped: usize,
}

/// Orchestrates gateway, validators, registry and reporter per file
pub struct IngestionPipeline {
    layout: DirectoryLayout,
    registry: ProcessedFileRegistry,
    reporter: ErrorReporter,
    validator: ContentValidator,
}

impl IngestionPipeline {
    /// Build a pipeline over the given directory layout
    ///
    /// Creates any missing areas and loads the registry snapshot once.
    pub fn new(layout: DirectoryLayout) -> Result<Self> {
        layout.ensure_exists()?;
        let registry = ProcessedFileRegistry::load(layout.registry_path())?;
        let reporter = ErrorReporter::new(layout.error_log_path());

        Ok(Self {
            layout,
            registry,
            reporter,
            validator: ContentValidator::new(),
        })
    }

    /// Registry of already archived filenames
    pub fn registry(&self) -> &ProcessedFileRegistry {
        &self.registry
    }

    /// Full state machine: download, validate, archive or reject
    pub fn process<S: RemoteSource>(
        &mut self,
        source: &mut S,
        files: &[String],
        events: &EventSink,
    ) -> ProcessSummary {
        let mut summary = ProcessSummary::default();

        for name in files {
            if self.registry.contains(name) {
                emit(
                    events,
                    StatusEvent::warning(format!("Skipping: {} (already processed)", name)),
                );
                summary.skipped += 1;
                continue;
            }

            emit(events, StatusEvent::info(format!("Processing: {}", name)));
            info!(file = %name, "Processing remote file");

            let local_path = self.layout.download_dir.join(name);
            match download(source, name, &local_path) {
                Ok(bytes) => {
                    emit(
                        events,
                        StatusEvent::success(format!("Downloaded {} bytes", bytes)),
                    );
                },
                Err(e) => {
                    emit(
                        events,
                        StatusEvent::error(format!("Download failed for {}: {}", name, e)),
                    );
                    summary.rejected += 1;
                    continue;
                },
            }

            if !filename::matches(name) {
                emit(
                    events,
                    StatusEvent::error(format!(
                        "Invalid filename pattern (expected {})",
                        filename::expected_pattern()
                    )),
                );
                if let Some(guid) =
                    self.reject_file(name, &local_path, "Invalid filename pattern", events)
                {
                    emit(
                        events,
                        StatusEvent::error(format!(
                            "Rejected: invalid filename pattern (GUID: {})",
                            guid
                        )),
                    );
                }
                summary.rejected += 1;
                continue;
            }
            emit(events, StatusEvent::success("Filename pattern valid"));

            emit(events, StatusEvent::info("Validating content..."));
            let verdict = self.validator.validate_path(&local_path);
            emit_content_trace(&verdict, events);

            if verdict.valid {
                if self.archive_file(name, &local_path, &verdict, events) {
                    summary.archived += 1;
                } else {
                    summary.rejected += 1;
                }
            } else {
                let detail = rejection_summary(&verdict.errors);
                if let Some(guid) = self.reject_file(name, &local_path, &detail, events) {
                    emit(
                        events,
                        StatusEvent::error(format!(
                            "Rejected ({} errors) (GUID: {})",
                            verdict.errors.len(),
                            guid
                        )),
                    );
                    for error in verdict.errors.iter().take(REPORTED_ERROR_LIMIT) {
                        emit(events, StatusEvent::error(format!("  - {}", error)));
                    }
                }
                summary.rejected += 1;
            }
        }

        emit(
            events,
            StatusEvent::summary(format!(
                "Summary: {} archived, {} rejected",
                summary.archived, summary.rejected
            )),
        );
        summary
    }

    /// Read-only diagnostics over a temporary local copy
    ///
    /// Originals stay on the server, the registry is never written, and the
    /// temporary copy is deleted whatever the outcome.
    pub fn validate<S: RemoteSource>(
        &mut self,
        source: &mut S,
        files: &[String],
        events: &EventSink,
    ) -> ValidateSummary {
        let mut summary = ValidateSummary::default();

        for name in files {
            if self.registry.contains(name) {
                emit(
                    events,
                    StatusEvent::warning(format!("Skipping: {} (already processed)", name)),
                );
                summary.skipped += 1;
                continue;
            }

            emit(events, StatusEvent::info(format!("Validating: {}", name)));

            let temp_path = self
                .layout
                .download_dir
                .join(format!("temp_validate_{}", name));

            match download(source, name, &temp_path) {
                Ok(_) => {},
                Err(e) => {
                    emit(
                        events,
                        StatusEvent::error(format!("Error validating {}: {}", name, e)),
                    );
                    summary.invalid += 1;
                    continue;
                },
            }

            if filename::matches(name) {
                emit(events, StatusEvent::success("Filename pattern valid"));
                let verdict = self.validator.validate_path(&temp_path);
                emit_content_trace(&verdict, events);

                if verdict.valid {
                    emit(
                        events,
                        StatusEvent::success(format!(
                            "VALID: {} ({} records)",
                            name, verdict.valid_record_count
                        )),
                    );
                    summary.valid += 1;
                } else {
                    emit(
                        events,
                        StatusEvent::error(format!(
                            "INVALID: {} ({} errors)",
                            name,
                            verdict.errors.len()
                        )),
                    );
                    summary.invalid += 1;
                }
            } else {
                emit(
                    events,
                    StatusEvent::error(format!(
                        "Invalid filename pattern (expected {})",
                        filename::expected_pattern()
                    )),
                );
                summary.invalid += 1;
            }

            remove_if_exists(&temp_path);
        }

        emit(
            events,
            StatusEvent::summary(format!(
                "Results: {} valid, {} invalid",
                summary.valid, summary.invalid
            )),
        );
        summary
    }

    /// Move a validated file into the archive area and register it
    ///
    /// The registry write happens only after the rename succeeds, so the
    /// registry never names a file that is not provably archived. The
    /// reverse window (archived but not yet registered) is a known
    /// idempotency gap.
    fn archive_file(
        &mut self,
        name: &str,
        local_path: &Path,
        verdict: &ValidationVerdict,
        events: &EventSink,
    ) -> bool {
        let archived_name = archive_name(name, &Local::now().format("%Y%m%d").to_string());
        let archive_path = self.layout.archive_dir.join(&archived_name);

        if let Err(e) = std::fs::rename(local_path, &archive_path) {
            let detail = format!("Archival failed: {}", e);
            let guid = self.log_error(name, &detail, events);
            emit(
                events,
                StatusEvent::error(match guid {
                    Some(guid) => format!("Archival error for {} (GUID: {})", name, guid),
                    None => format!("Archival error for {}", name),
                }),
            );
            remove_if_exists(&archive_path);
            remove_if_exists(local_path);
            return false;
        }

        if let Err(e) = self.registry.add(name) {
            warn!(file = %name, error = %e, "Archived file could not be registered");
            self.log_error(name, &format!("Registry update failed: {}", e), events);
            emit(
                events,
                StatusEvent::warning(format!(
                    "Archived but failed to update registry for {}: {}",
                    name, e
                )),
            );
        }

        emit(
            events,
            StatusEvent::success(format!(
                "Archived as: {} ({} records)",
                archived_name, verdict.valid_record_count
            )),
        );
        info!(file = %name, archived_as = %archived_name, "File archived");
        true
    }

    /// Move a rejected file into the error area unmodified and log it
    ///
    /// Returns the error-log GUID when both the move and the log write
    /// succeeded.
    fn reject_file(
        &mut self,
        name: &str,
        local_path: &Path,
        detail: &str,
        events: &EventSink,
    ) -> Option<Uuid> {
        let error_path = self.layout.error_dir.join(name);
        if let Err(e) = std::fs::rename(local_path, &error_path) {
            let move_detail = format!("Failed to move to error area: {}", e);
            self.log_error(name, &move_detail, events);
            emit(
                events,
                StatusEvent::error(format!("{} for {}", move_detail, name)),
            );
            remove_if_exists(local_path);
            return None;
        }

        self.log_error(name, detail, events)
    }

    /// Write one error-log entry, degrading to a warning event on failure
    fn log_error(&self, name: &str, detail: &str, events: &EventSink) -> Option<Uuid> {
        match self.reporter.log(name, detail) {
            Ok(guid) => Some(guid),
            Err(e) => {
                warn!(file = %name, error = %e, "Failed to write error log entry");
                emit(
                    events,
                    StatusEvent::warning(format!("Failed to write error log: {}", e)),
                );
                None
            },
        }
    }
}

/// Download one remote file to a local path, cleaning up on failure
fn download<S: RemoteSource>(source: &mut S, name: &str, path: &Path) -> Result<u64> {
    let result = std::fs::File::create(path)
        .map_err(Into::into)
        .and_then(|mut file| source.retrieve(name, &mut file));

    if result.is_err() {
        remove_if_exists(path);
    }
    result
}

/// Emit the per-file diagnostic trace for a content verdict
fn emit_content_trace(verdict: &ValidationVerdict, events: &EventSink) {
    // File-level defects (header, empty, read) already carry the whole story
    if let Some(error) = verdict
        .errors
        .first()
        .filter(|e| matches!(
            e.category,
            DefectCategory::Header | DefectCategory::EmptyFile | DefectCategory::Read
        ))
    {
        emit(events, StatusEvent::error(error.to_string()));
        return;
    }

    emit(
        events,
        StatusEvent::success(format!(
            "Header valid ({} fields)",
            crate::content::EXPECTED_HEADER.len()
        )),
    );
    emit(
        events,
        StatusEvent::info(format!("Scanned {} rows", verdict.rows_scanned)),
    );
    emit(
        events,
        StatusEvent::success(format!("Valid records: {}", verdict.valid_record_count)),
    );
    for (category, count) in verdict.category_counts() {
        emit(
            events,
            StatusEvent::error(format!("{} errors: {}", category.label(), count)),
        );
    }
}

/// Error-log message for a content rejection: the first few errors joined,
/// plus a count of the remainder
fn rejection_summary(errors: &[RecordError]) -> String {
    let mut summary = errors
        .iter()
        .take(REPORTED_ERROR_LIMIT)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ");
    if errors.len() > REPORTED_ERROR_LIMIT {
        summary.push_str(&format!(" ... and {} more", errors.len() - REPORTED_ERROR_LIMIT));
    }
    summary
}

/// Archive name: original base, processing date, original extension
fn archive_name(name: &str, date: &str) -> String {
    match name.rfind('.') {
        Some(dot) => format!("{}_{}{}", &name[..dot], date, &name[dot..]),
        None => format!("{}_{}", name, date),
    }
}

fn remove_if_exists(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            debug!(path = %path.display(), error = %e, "Failed to remove file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_name_keeps_original_extension() {
        assert_eq!(
            archive_name("CLINICALDATA20240101000000.CSV", "20260804"),
            "CLINICALDATA20240101000000_20260804.CSV"
        );
        assert_eq!(
            archive_name("clinicaldata20240101000000.csv", "20260804"),
            "clinicaldata20240101000000_20260804.csv"
        );
        assert_eq!(archive_name("nodot", "20260804"), "nodot_20260804");
    }

    #[test]
    fn test_rejection_summary_caps_at_three() {
        let errors: Vec<RecordError> = (2..7)
            .map(|row| RecordError {
                row,
                category: DefectCategory::Dosage,
                message: format!("Non-numeric dosage: 'x{}'", row),
            })
            .collect();

        let summary = rejection_summary(&errors);
        assert!(summary.contains("Row 2"));
        assert!(summary.contains("Row 4"));
        assert!(!summary.contains("Row 5:"));
        assert!(summary.ends_with("... and 2 more"));
    }

    #[test]
    fn test_rejection_summary_short_list_has_no_suffix() {
        let errors = vec![RecordError {
            row: 2,
            category: DefectCategory::DateRange,
            message: "EndDate (2024-01-01) before StartDate (2024-02-01)".to_string(),
        }];
        let summary = rejection_summary(&errors);
        assert!(!summary.contains("more"));
        assert!(summary.starts_with("Row 2:"));
    }
}
