//! Helix Ingest Library
//!
//! Core ingestion pipeline for clinical-trial CSV files delivered over FTP.
//!
//! # Overview
//!
//! Files are listed on a remote server, downloaded one at a time, validated
//! against a fixed filename pattern and a fixed 9-column schema, and routed
//! to an archive area (valid) or an error area (invalid). Every decision is
//! recorded: archived filenames go to a durable registry so they are never
//! reprocessed, rejections go to an append-only GUID-tagged error log, and
//! the whole run streams ordered [`StatusEvent`]s to whichever front end is
//! listening.
//!
//! - **Gateway**: [`ftp::FtpGateway`] wraps the FTP session (connect, list,
//!   retrieve, disconnect)
//! - **Validation**: [`filename`] checks the name pattern,
//!   [`content::ContentValidator`] streams the CSV rows
//! - **Persistence**: [`registry::ProcessedFileRegistry`] and
//!   [`report::ErrorReporter`]
//! - **Orchestration**: [`pipeline::IngestionPipeline`] runs the per-file
//!   state machine, [`worker::WorkerCoordinator`] runs it off the control
//!   path with at most one worker in flight

pub mod config;
pub mod content;
pub mod events;
pub mod filename;
pub mod ftp;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod worker;

// Re-export commonly used types
pub use config::{DirectoryLayout, FtpConfig};
pub use events::{EventSink, Severity, StatusEvent};
pub use pipeline::{IngestionPipeline, ProcessSummary, RemoteSource, ValidateSummary};
pub use worker::{Submission, WorkerCoordinator};
