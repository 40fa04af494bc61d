//! Filename pattern validation
//!
//! Incoming files must be named `CLINICALDATA` + a 14-digit timestamp
//! (`YYYYMMDDHHMMSS`) + `.CSV`, case-insensitive on both the prefix and the
//! extension. The timestamp digits are not interpreted.

use regex::Regex;
use std::sync::OnceLock;

/// Literal prefix of every valid incoming file name
pub const FILENAME_PREFIX: &str = "CLINICALDATA";

/// Fixed extension of every incoming file, compared case-insensitively
pub const FILENAME_EXTENSION: &str = ".CSV";

static PATTERN: OnceLock<Regex> = OnceLock::new();

fn pattern() -> &'static Regex {
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^CLINICALDATA\d{14}\.CSV$").expect("filename pattern is valid")
    })
}

/// Whether a server-listed name matches the required pattern
///
/// Pure predicate; no side effects.
pub fn matches(name: &str) -> bool {
    pattern().is_match(name)
}

/// Human-readable description of the expected pattern, for diagnostics
pub fn expected_pattern() -> String {
    format!("{}YYYYMMDDHHMMSS{}", FILENAME_PREFIX, FILENAME_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_filenames() {
        assert!(matches("CLINICALDATA20240115093000.CSV"));
        assert!(matches("clinicaldata20240115093000.csv"));
        assert!(matches("ClinicalData20240115093000.Csv"));
    }

    #[test]
    fn test_wrong_digit_count() {
        assert!(!matches("CLINICALDATA2024011509300.CSV"));
        assert!(!matches("CLINICALDATA202401150930001.CSV"));
        assert!(!matches("CLINICALDATA.CSV"));
    }

    #[test]
    fn test_wrong_prefix_or_extension() {
        assert!(!matches("TRIALDATA20240115093000.CSV"));
        assert!(!matches("CLINICALDATA20240115093000.TXT"));
        assert!(!matches("CLINICALDATA20240115093000.CSV.bak"));
        assert!(!matches("xCLINICALDATA20240115093000.CSV"));
    }

    #[test]
    fn test_non_digit_timestamp() {
        assert!(!matches("CLINICALDATA2024011509300A.CSV"));
    }
}
