//! Helix CLI Library
//!
//! Command-line front end for the clinical-trial ingestion pipeline. The CLI
//! is one consumer of the pipeline's event channel; it owns no pipeline
//! logic of its own:
//!
//! - **Listing**: show CSV files on the server (`helix list`)
//! - **Validation**: read-only diagnostics (`helix validate`)
//! - **Processing**: download, validate, archive or reject (`helix process`)

pub mod progress;
pub mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use helix_ingest::config::{DirectoryLayout, FtpConfig};
use std::path::PathBuf;

/// Helix - Clinical Trial Data Processor
#[derive(Parser, Debug)]
#[command(name = "helix")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit events as JSON lines instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    /// FTP server hostname
    #[arg(long, env = "HELIX_FTP_HOST", default_value = "localhost", global = true)]
    pub host: String,

    /// FTP server port
    #[arg(long, env = "HELIX_FTP_PORT", default_value = "21", global = true)]
    pub port: u16,

    /// FTP username
    #[arg(long, env = "HELIX_FTP_USER", default_value = "anonymous", global = true)]
    pub username: String,

    /// FTP password
    #[arg(
        long,
        env = "HELIX_FTP_PASSWORD",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    pub password: String,

    /// Remote directory to change into after login
    #[arg(long, env = "HELIX_FTP_REMOTE_DIR", global = true)]
    pub remote_dir: Option<String>,

    /// Root for the local areas (defaults to ~/ClinicalData)
    #[arg(long, global = true)]
    pub data_root: Option<PathBuf>,

    /// Download area (defaults to <data-root>/Downloads)
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,

    /// Archive area (defaults to <data-root>/Archive)
    #[arg(long, global = true)]
    pub archive_dir: Option<PathBuf>,

    /// Error area (defaults to <data-root>/Errors)
    #[arg(long, global = true)]
    pub error_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List CSV files available on the server
    List,

    /// Validate files without moving or archiving anything
    Validate {
        /// Files to validate, named as listed by the server
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Download files, then archive valid ones and reject invalid ones
    Process {
        /// Files to process, named as listed by the server
        #[arg(required = true)]
        files: Vec<String>,
    },
}

impl Cli {
    /// FTP connection settings from flags and environment
    pub fn ftp_config(&self) -> FtpConfig {
        FtpConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            remote_dir: self.remote_dir.clone(),
        }
    }

    /// Resolve the local directory layout
    pub fn layout(&self) -> anyhow::Result<DirectoryLayout> {
        let root = match &self.data_root {
            Some(root) => root.clone(),
            None => dirs::home_dir()
                .context("Could not determine home directory; pass --data-root")?
                .join("ClinicalData"),
        };

        Ok(DirectoryLayout::new(
            self.download_dir
                .clone()
                .unwrap_or_else(|| root.join("Downloads")),
            self.archive_dir
                .clone()
                .unwrap_or_else(|| root.join("Archive")),
            self.error_dir.clone().unwrap_or_else(|| root.join("Errors")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_layout_from_data_root() {
        let cli = Cli::parse_from(["helix", "--data-root", "/srv/clinical", "list"]);
        let layout = cli.layout().unwrap();
        assert_eq!(layout.download_dir, PathBuf::from("/srv/clinical/Downloads"));
        assert_eq!(layout.archive_dir, PathBuf::from("/srv/clinical/Archive"));
        assert_eq!(layout.error_dir, PathBuf::from("/srv/clinical/Errors"));
    }

    #[test]
    fn test_explicit_dirs_override_root() {
        let cli = Cli::parse_from([
            "helix",
            "--data-root",
            "/srv/clinical",
            "--error-dir",
            "/var/quarantine",
            "list",
        ]);
        let layout = cli.layout().unwrap();
        assert_eq!(layout.error_dir, PathBuf::from("/var/quarantine"));
        assert_eq!(layout.archive_dir, PathBuf::from("/srv/clinical/Archive"));
    }

    #[test]
    fn test_ftp_config_from_flags() {
        let cli = Cli::parse_from([
            "helix",
            "--host",
            "ftp.trials.example.com",
            "--port",
            "2121",
            "--username",
            "steph",
            "--remote-dir",
            "incoming",
            "list",
        ]);
        let config = cli.ftp_config();
        assert_eq!(config.host, "ftp.trials.example.com");
        assert_eq!(config.port, 2121);
        assert_eq!(config.username, "steph");
        assert_eq!(config.remote_dir.as_deref(), Some("incoming"));
    }
}
