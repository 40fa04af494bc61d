//! Error types for Helix

use thiserror::Error;

/// Result type alias for Helix operations
pub type Result<T> = std::result::Result<T, HelixError>;

/// Main error type for Helix
///
/// Connection and listing failures are recoverable: the caller may retry the
/// top-level operation. Per-file rejection (filename pattern, content) is a
/// verdict, not an error, and never surfaces through this type.
#[derive(Error, Debug)]
pub enum HelixError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Listing failed: {0}")]
    Listing(String),

    #[error("Retrieval of '{file}' failed: {reason}")]
    Retrieve { file: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HelixError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a listing error
    pub fn listing(msg: impl Into<String>) -> Self {
        Self::Listing(msg.into())
    }

    /// Create a retrieval error for a named file
    pub fn retrieve(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Retrieve {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieve_error_display() {
        let err = HelixError::retrieve("CLINICALDATA20240101120000.CSV", "timed out");
        assert_eq!(
            err.to_string(),
            "Retrieval of 'CLINICALDATA20240101120000.CSV' failed: timed out"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: HelixError = io.into();
        assert!(matches!(err, HelixError::Io(_)));
    }
}
