//! CSV content validation against the fixed clinical-trial schema
//!
//! The validator streams a file row by row and produces a file-level
//! [`ValidationVerdict`]: any row-level defect makes the whole file invalid,
//! but the full error list and the count of clean rows are still reported so
//! a rejection is diagnosable.
//!
//! # Schema
//!
//! Exactly nine columns, in order:
//! `PatientID, TrialCode, DrugCode, Dosage_mg, StartDate, EndDate, Outcome,
//! SideEffects, Analyst`. Dates are `YYYY-MM-DD`, dosage is a positive
//! integer, outcome is one of three literal values, and the
//! (PatientID, TrialCode, DrugCode) triple must be unique within the file.

use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// The exact header row every file must start with
pub const EXPECTED_HEADER: [&str; 9] = [
    "PatientID",
    "TrialCode",
    "DrugCode",
    "Dosage_mg",
    "StartDate",
    "EndDate",
    "Outcome",
    "SideEffects",
    "Analyst",
];

/// Allowed values of the Outcome column
pub const OUTCOME_VALUES: [&str; 3] = ["Improved", "No Change", "Worsened"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Category of a single validation defect
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DefectCategory {
    /// First row does not equal the expected header
    Header,
    /// File contains no rows at all
    EmptyFile,
    /// File could not be read as CSV (includes invalid UTF-8)
    Read,
    /// Row does not have exactly nine fields
    FieldCount,
    /// One or more fields are empty
    MissingField,
    /// Dosage is not a positive integer
    Dosage,
    /// A date field is not a valid `YYYY-MM-DD` date
    DateFormat,
    /// EndDate precedes StartDate
    DateRange,
    /// Outcome is not one of the allowed values
    Outcome,
    /// Composite key already seen earlier in the file
    Duplicate,
}

impl DefectCategory {
    /// Short label used in the per-category diagnostic counts
    pub fn label(&self) -> &'static str {
        match self {
            DefectCategory::Header => "Header",
            DefectCategory::EmptyFile => "Empty file",
            DefectCategory::Read => "Read",
            DefectCategory::FieldCount => "Field count",
            DefectCategory::MissingField => "Missing fields",
            DefectCategory::Dosage => "Dosage",
            DefectCategory::DateFormat => "Date format",
            DefectCategory::DateRange => "Date range",
            DefectCategory::Outcome => "Outcome",
            DefectCategory::Duplicate => "Duplicate",
        }
    }
}

/// One defect found during validation
///
/// `row` is the 1-based physical row (the header is row 1, the first data
/// row is row 2); file-level defects use row 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    pub row: usize,
    pub category: DefectCategory,
    pub message: String,
}

impl RecordError {
    fn file_level(category: DefectCategory, message: impl Into<String>) -> Self {
        Self {
            row: 0,
            category,
            message: message.into(),
        }
    }

    fn at_row(row: usize, category: DefectCategory, message: impl Into<String>) -> Self {
        Self {
            row,
            category,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.row == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "Row {}: {}", self.row, self.message)
        }
    }
}

/// File-level validity decision aggregated from all row-level checks
///
/// Invariant: `valid == errors.is_empty()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    pub errors: Vec<RecordError>,
    pub valid_record_count: usize,
    pub rows_scanned: usize,
}

impl ValidationVerdict {
    fn rejected(error: RecordError) -> Self {
        Self {
            valid: false,
            errors: vec![error],
            valid_record_count: 0,
            rows_scanned: 0,
        }
    }

    /// Number of defects per category, for the diagnostic trace
    pub fn category_counts(&self) -> BTreeMap<DefectCategory, usize> {
        let mut counts = BTreeMap::new();
        for error in &self.errors {
            *counts.entry(error.category).or_insert(0) += 1;
        }
        counts
    }
}

/// Streaming validator for clinical-trial CSV content
#[derive(Debug, Default)]
pub struct ContentValidator;

impl ContentValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a local file
    ///
    /// An unreadable file yields an invalid verdict, not an error: content
    /// problems never abort a batch.
    pub fn validate_path(&self, path: &Path) -> ValidationVerdict {
        match File::open(path) {
            Ok(file) => self.validate_reader(file),
            Err(e) => ValidationVerdict::rejected(RecordError::file_level(
                DefectCategory::Read,
                format!("File read error: {}", e),
            )),
        }
    }

    /// Validate CSV bytes from any reader
    pub fn validate_reader<R: Read>(&self, reader: R) -> ValidationVerdict {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = csv_reader.records();

        // Header row: any mismatch fails the file immediately, no row scan
        match records.next() {
            None => {
                return ValidationVerdict::rejected(RecordError::file_level(
                    DefectCategory::EmptyFile,
                    "File is empty",
                ));
            },
            Some(Err(e)) => {
                return ValidationVerdict::rejected(RecordError::file_level(
                    DefectCategory::Read,
                    format!("File read error: {}", e),
                ));
            },
            Some(Ok(header)) => {
                if header.len() != EXPECTED_HEADER.len()
                    || !header.iter().eq(EXPECTED_HEADER.iter().copied())
                {
                    return ValidationVerdict::rejected(RecordError::at_row(
                        1,
                        DefectCategory::Header,
                        format!(
                            "Invalid header. Expected {} fields: {}",
                            EXPECTED_HEADER.len(),
                            EXPECTED_HEADER.join(", ")
                        ),
                    ));
                }
            },
        }

        let mut errors = Vec::new();
        let mut valid_record_count = 0;
        let mut rows_scanned = 0;
        let mut seen_keys: HashSet<(String, String, String)> = HashSet::new();
        let mut row = 1;

        for record in records {
            row += 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    // A broken read makes the rest of the file unreachable;
                    // the verdict reports only the read failure
                    return ValidationVerdict::rejected(RecordError::file_level(
                        DefectCategory::Read,
                        format!("File read error: {}", e),
                    ));
                },
            };
            rows_scanned += 1;

            if record.len() != EXPECTED_HEADER.len() {
                errors.push(RecordError::at_row(
                    row,
                    DefectCategory::FieldCount,
                    format!("Expected {} fields, got {}", EXPECTED_HEADER.len(), record.len()),
                ));
                continue;
            }

            let mut defects = Vec::new();
            let fields: Vec<&str> = record.iter().collect();
            let (patient_id, trial_code, drug_code, dosage, start_date, end_date, outcome) = (
                fields[0], fields[1], fields[2], fields[3], fields[4], fields[5], fields[6],
            );

            if fields.iter().any(|f| f.is_empty()) {
                defects.push((DefectCategory::MissingField, "Missing required fields".to_string()));
            }

            match dosage.parse::<i64>() {
                Ok(value) if value > 0 => {},
                Ok(_) => defects.push((
                    DefectCategory::Dosage,
                    format!("Dosage must be a positive integer, got '{}'", dosage),
                )),
                Err(_) => defects.push((
                    DefectCategory::Dosage,
                    format!("Non-numeric dosage: '{}'", dosage),
                )),
            }

            match (
                NaiveDate::parse_from_str(start_date, DATE_FORMAT),
                NaiveDate::parse_from_str(end_date, DATE_FORMAT),
            ) {
                (Ok(start), Ok(end)) => {
                    if end < start {
                        defects.push((
                            DefectCategory::DateRange,
                            format!("EndDate ({}) before StartDate ({})", end_date, start_date),
                        ));
                    }
                },
                _ => defects.push((
                    DefectCategory::DateFormat,
                    "Invalid date format (expected YYYY-MM-DD)".to_string(),
                )),
            }

            if !OUTCOME_VALUES.contains(&outcome) {
                defects.push((
                    DefectCategory::Outcome,
                    format!("Invalid outcome '{}'", outcome),
                ));
            }

            // First occurrence of a composite key wins; later ones are
            // flagged, not silently dropped
            let key = (
                patient_id.to_string(),
                trial_code.to_string(),
                drug_code.to_string(),
            );
            if !seen_keys.insert(key) {
                defects.push((DefectCategory::Duplicate, "Duplicate record".to_string()));
            }

            if defects.is_empty() {
                valid_record_count += 1;
            } else {
                for (category, message) in defects {
                    errors.push(RecordError::at_row(row, category, message));
                }
            }
        }

        ValidationVerdict {
            valid: errors.is_empty(),
            errors,
            valid_record_count,
            rows_scanned,
        }
    }
}
