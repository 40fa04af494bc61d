//! FTP gateway for the remote drop directory
//!
//! Thin wrapper over a synchronous `suppaftp` session exposing the three
//! operations the pipeline needs: connect, list, retrieve. The gateway is
//! deliberately blocking; pipeline operations run on a background worker
//! task (see [`crate::worker`]), never on the control path.
//!
//! Sessions use Extended Passive Mode (EPSV) for NAT/firewall compatibility
//! and binary transfer type. The connect attempt is bounded by a fixed
//! timeout; read timeouts ride on the library's socket defaults.

use helix_common::{HelixError, Result};
use std::io::Write;
use std::net::ToSocketAddrs;
use std::time::Duration;
use suppaftp::FtpStream;
use tracing::{debug, info, warn};

use crate::config::FtpConfig;
use crate::filename::FILENAME_EXTENSION;
use crate::pipeline::RemoteSource;

/// Bound on the TCP connect attempt
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Facts reported by a successful connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    /// Server-reported working directory after login (and optional CWD)
    pub working_dir: String,

    /// Set when the configured remote subdirectory could not be entered;
    /// the session stays usable in the login directory
    pub subdir_warning: Option<String>,
}

/// Result of a disconnect attempt
///
/// Disconnect never raises; a failed QUIT is reported, not swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// Session closed cleanly
    Closed,
    /// There was no live session to close
    NotConnected,
    /// QUIT failed; the socket is dropped regardless
    Failed(String),
}

/// FTP session wrapper holding the live connection between operations
pub struct FtpGateway {
    config: FtpConfig,
    stream: Option<FtpStream>,
}

impl FtpGateway {
    pub fn new(config: FtpConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    /// Establish (or re-establish) the session
    ///
    /// An existing session is dropped best-effort first. Connect failures
    /// are recoverable: the caller may retry the whole operation.
    pub fn connect(&mut self) -> Result<ConnectInfo> {
        if let Some(mut old) = self.stream.take() {
            let _ = old.quit();
        }

        debug!(
            "Connecting to FTP server: {}:{}",
            self.config.host, self.config.port
        );

        let addr = (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()
            .map_err(|e| {
                HelixError::connection(format!(
                    "Failed to resolve {}:{}: {}",
                    self.config.host, self.config.port, e
                ))
            })?
            .next()
            .ok_or_else(|| {
                HelixError::connection(format!("No addresses for host {}", self.config.host))
            })?;

        let mut stream = FtpStream::connect_timeout(addr, CONNECT_TIMEOUT)
            .map_err(|e| HelixError::connection(format!("Failed to connect: {}", e)))?;

        // Extended Passive Mode works better through NAT than standard PASV
        stream.set_mode(suppaftp::Mode::ExtendedPassive);

        debug!("Logging in as: {}", self.config.username);
        stream
            .login(&self.config.username, &self.config.password)
            .map_err(|e| HelixError::connection(format!("Login failed: {}", e)))?;

        stream
            .transfer_type(suppaftp::types::FileType::Binary)
            .map_err(|e| HelixError::connection(format!("Failed to set binary mode: {}", e)))?;

        let mut subdir_warning = None;
        if let Some(remote_dir) = self.config.remote_dir.as_deref() {
            if !remote_dir.is_empty() {
                if let Err(e) = stream.cwd(remote_dir) {
                    warn!(remote_dir, error = %e, "Could not change to remote directory");
                    subdir_warning = Some(format!(
                        "Could not change to remote directory '{}': {}",
                        remote_dir, e
                    ));
                }
            }
        }

        let working_dir = stream
            .pwd()
            .map_err(|e| HelixError::connection(format!("Failed to read working directory: {}", e)))?;

        info!(host = %self.config.host, working_dir, "FTP connection established");
        self.stream = Some(stream);

        Ok(ConnectInfo {
            working_dir,
            subdir_warning,
        })
    }

    /// Whether a session is currently held
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Close the session, reporting rather than raising failures
    pub fn disconnect(&mut self) -> DisconnectOutcome {
        match self.stream.take() {
            None => DisconnectOutcome::NotConnected,
            Some(mut stream) => match stream.quit() {
                Ok(()) => {
                    debug!("FTP session closed");
                    DisconnectOutcome::Closed
                },
                Err(e) => {
                    warn!(error = %e, "FTP QUIT failed");
                    DisconnectOutcome::Failed(e.to_string())
                },
            },
        }
    }

    fn session(&mut self) -> Result<&mut FtpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| HelixError::connection("Not connected to FTP server"))
    }
}

impl RemoteSource for FtpGateway {
    /// List CSV files in the current remote directory, sorted lexically
    fn list(&mut self) -> Result<Vec<String>> {
        let names = self
            .session()?
            .nlst(None)
            .map_err(|e| HelixError::listing(e.to_string()))?;

        let mut csv_files: Vec<String> = names.into_iter().filter(|n| is_csv_name(n)).collect();
        csv_files.sort();

        debug!(count = csv_files.len(), "Listed remote CSV files");
        Ok(csv_files)
    }

    /// Stream one remote file into the sink, returning the byte count
    fn retrieve(&mut self, name: &str, sink: &mut dyn Write) -> Result<u64> {
        let stream = self.session()?;

        let bytes = stream
            .retr(name, |reader| {
                std::io::copy(reader, sink).map_err(suppaftp::FtpError::ConnectionError)
            })
            .map_err(|e| HelixError::retrieve(name, e.to_string()))?;

        debug!(name, bytes, "Retrieved remote file");
        Ok(bytes)
    }
}

/// Case-insensitive check for the fixed incoming extension
fn is_csv_name(name: &str) -> bool {
    name.to_uppercase().ends_with(FILENAME_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_csv_name() {
        assert!(is_csv_name("CLINICALDATA20240101000000.CSV"));
        assert!(is_csv_name("lowercase.csv"));
        assert!(is_csv_name("Mixed.Csv"));
        assert!(!is_csv_name("notes.txt"));
        assert!(!is_csv_name("archive.csv.gz"));
    }

    #[test]
    fn test_operations_require_connection() {
        let mut gateway = FtpGateway::new(FtpConfig::default());
        assert!(!gateway.is_connected());
        assert!(matches!(
            gateway.list(),
            Err(HelixError::Connection(_))
        ));
    }

    #[test]
    fn test_disconnect_without_session() {
        let mut gateway = FtpGateway::new(FtpConfig::default());
        assert_eq!(gateway.disconnect(), DisconnectOutcome::NotConnected);
    }
}
