//! Helix CLI - Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use helix_cli::{progress, render, Cli, Commands};
use helix_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use helix_ingest::config::{DirectoryLayout, FtpConfig};
use helix_ingest::events::{emit, EventSink, Severity, StatusEvent};
use helix_ingest::ftp::{DisconnectOutcome, FtpGateway};
use helix_ingest::pipeline::{IngestionPipeline, RemoteSource};
use helix_ingest::worker::{Submission, WorkerCoordinator};
use std::process;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::error;

/// How often the control context drains the event channel
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Verbose mode logs to console; normal mode stays quiet below warnings
    let log_config = if cli.verbose {
        LogConfig::builder()
            .level(LogLevel::Debug)
            .output(LogOutput::Console)
            .log_file_prefix("helix")
            .build()
    } else {
        LogConfig::builder()
            .level(LogLevel::Warn)
            .output(LogOutput::Console)
            .log_file_prefix("helix")
            .build()
    };

    // Environment variables override individual flag-derived settings
    let log_config = match LogConfig::from_env_with_defaults(log_config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring invalid LOG_* environment variable: {:#}", e);
            log_config
        },
    };

    // The CLI must work even if logging cannot be initialized
    let _ = init_logging(&log_config);

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Submit the requested operation and drain its event channel
async fn run(cli: Cli) -> Result<()> {
    let ftp_config = cli.ftp_config();
    let layout = cli.layout()?;
    let json = cli.json;
    let command = cli.command;

    let coordinator = WorkerCoordinator::new();
    let submission =
        coordinator.submit(move |events| run_operation(command, ftp_config, layout, events));

    let Submission::Accepted { mut events, handle } = submission else {
        anyhow::bail!("A worker is already active; try again once it completes");
    };

    let spinner = (!json).then(|| progress::create_spinner("Working..."));

    // Drain the channel at a fixed interval until the terminal event
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    'poll: loop {
        ticker.tick().await;
        loop {
            match events.try_recv() {
                Ok(event) => {
                    let terminal = event.severity == Severity::Complete;
                    match &spinner {
                        Some(pb) => pb.suspend(|| render::render(&event, json)),
                        None => render::render(&event, json),
                    }
                    if terminal {
                        break 'poll;
                    }
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'poll,
            }
        }
    }

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    handle.await.context("Worker task failed")?;
    Ok(())
}

/// The worker-side operation: connect, run the requested command, disconnect
fn run_operation(
    command: Commands,
    ftp_config: FtpConfig,
    layout: DirectoryLayout,
    events: &EventSink,
) -> Result<()> {
    let host = ftp_config.host.clone();
    let mut gateway = FtpGateway::new(ftp_config);

    let info = gateway.connect().context("FTP connection failed")?;
    emit(events, StatusEvent::success(format!("Connected to {}", host)));
    emit(
        events,
        StatusEvent::info(format!("Current directory: {}", info.working_dir)),
    );
    if let Some(warning) = info.subdir_warning {
        emit(events, StatusEvent::warning(warning));
    }

    match command {
        Commands::List => {
            let files = gateway.list().context("Failed to retrieve file list")?;
            if files.is_empty() {
                emit(events, StatusEvent::warning("No CSV files found"));
            } else {
                emit(
                    events,
                    StatusEvent::success(format!("Found {} CSV files", files.len())),
                );
                for file in &files {
                    emit(events, StatusEvent::info(file.clone()));
                }
            }
        },
        Commands::Validate { files } => {
            let mut pipeline = IngestionPipeline::new(layout)?;
            pipeline.validate(&mut gateway, &files, events);
        },
        Commands::Process { files } => {
            let mut pipeline = IngestionPipeline::new(layout)?;
            pipeline.process(&mut gateway, &files, events);
        },
    }

    if let DisconnectOutcome::Failed(reason) = gateway.disconnect() {
        emit(
            events,
            StatusEvent::warning(format!("Disconnect failed: {}", reason)),
        );
    }

    Ok(())
}
