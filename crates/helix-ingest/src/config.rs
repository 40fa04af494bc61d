//! Configuration for the FTP connection and local directory layout

use helix_common::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the processed-file registry inside the download area
pub const REGISTRY_FILE_NAME: &str = "processed_files.txt";

/// File name of the append-only error log inside the error area
pub const ERROR_LOG_FILE_NAME: &str = "error_report.log";

/// Configuration for the FTP connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpConfig {
    /// FTP server hostname
    pub host: String,

    /// FTP server port (usually 21)
    pub port: u16,

    /// FTP username
    pub username: String,

    /// FTP password
    pub password: String,

    /// Optional remote directory to change into after login; failure to
    /// change into it is a warning, not an error
    pub remote_dir: Option<String>,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 21,
            username: "anonymous".to_string(),
            password: "user@example.com".to_string(),
            remote_dir: None,
        }
    }
}

/// Local directory layout for the three file areas
///
/// Each area is a flat namespace. The registry lives in the download area
/// and the error log in the error area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryLayout {
    /// Where remote files land before validation
    pub download_dir: PathBuf,

    /// Where valid files are archived under a dated name
    pub archive_dir: PathBuf,

    /// Where rejected files are moved unmodified
    pub error_dir: PathBuf,
}

impl DirectoryLayout {
    pub fn new(
        download_dir: impl Into<PathBuf>,
        archive_dir: impl Into<PathBuf>,
        error_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            download_dir: download_dir.into(),
            archive_dir: archive_dir.into(),
            error_dir: error_dir.into(),
        }
    }

    /// All three areas under a common root (`downloads/`, `archive/`,
    /// `errors/`)
    pub fn under_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(
            root.join("downloads"),
            root.join("archive"),
            root.join("errors"),
        )
    }

    /// Create every area that does not exist yet
    pub fn ensure_exists(&self) -> Result<()> {
        for dir in [&self.download_dir, &self.archive_dir, &self.error_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Path of the processed-file registry snapshot
    pub fn registry_path(&self) -> PathBuf {
        self.download_dir.join(REGISTRY_FILE_NAME)
    }

    /// Path of the append-only error log
    pub fn error_log_path(&self) -> PathBuf {
        self.error_dir.join(ERROR_LOG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_under_root_layout() {
        let layout = DirectoryLayout::under_root("/data/clinical");
        assert_eq!(layout.download_dir, PathBuf::from("/data/clinical/downloads"));
        assert_eq!(layout.archive_dir, PathBuf::from("/data/clinical/archive"));
        assert_eq!(layout.error_dir, PathBuf::from("/data/clinical/errors"));
    }

    #[test]
    fn test_ensure_exists_creates_all_areas() {
        let root = tempdir().unwrap();
        let layout = DirectoryLayout::under_root(root.path());
        layout.ensure_exists().unwrap();

        assert!(layout.download_dir.is_dir());
        assert!(layout.archive_dir.is_dir());
        assert!(layout.error_dir.is_dir());
    }

    #[test]
    fn test_registry_and_error_log_paths() {
        let layout = DirectoryLayout::under_root("/data");
        assert_eq!(
            layout.registry_path(),
            PathBuf::from("/data/downloads/processed_files.txt")
        );
        assert_eq!(
            layout.error_log_path(),
            PathBuf::from("/data/errors/error_report.log")
        );
    }
}
