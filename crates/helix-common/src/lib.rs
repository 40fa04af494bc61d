//! Helix Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the Helix workspace.
//!
//! # Overview
//!
//! This crate provides functionality used across all Helix workspace members:
//!
//! - **Error Handling**: the [`HelixError`] taxonomy and [`Result`] alias
//! - **Logging**: `tracing` subscriber initialization with console/file targets
//!
//! # Example
//!
//! ```no_run
//! use helix_common::{HelixError, Result};
//!
//! fn resolve_host(host: &str) -> Result<()> {
//!     if host.is_empty() {
//!         return Err(HelixError::Config("FTP host must not be empty".into()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{HelixError, Result};
