//! Worker coordinator: at most one background operation in flight
//!
//! Pipeline operations block on network and file I/O, so they run on a
//! dedicated blocking task while the control context stays free to poll the
//! event channel. The busy flag is an atomic Idle→Busy transition, so two
//! near-simultaneous submissions cannot both start a worker; the loser is
//! rejected outright (no queuing).
//!
//! A worker always finishes by clearing the busy flag and then pushing a
//! terminal [`Severity::Complete`](crate::events::Severity) event, even when
//! the operation fails or panics, so the control context is never left
//! permanently busy.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::events::{emit, EventSink, StatusEvent};

/// Outcome of a submission attempt
pub enum Submission {
    /// A worker was started; drain `events` until the `complete` event
    Accepted {
        events: UnboundedReceiver<StatusEvent>,
        handle: JoinHandle<()>,
    },
    /// A worker is already active; nothing was started
    Busy,
}

impl Submission {
    pub fn is_busy(&self) -> bool {
        matches!(self, Submission::Busy)
    }
}

/// Gatekeeper for the single background worker
#[derive(Debug, Clone, Default)]
pub struct WorkerCoordinator {
    busy: Arc<AtomicBool>,
}

impl WorkerCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a worker is currently running
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start the operation on a background worker, unless one is active
    ///
    /// The operation receives the sending half of a fresh event channel and
    /// runs to completion; there is no cancellation. Events arrive on the
    /// receiver in exactly production order. The busy flag is cleared before
    /// the terminal `complete` event is sent, so observing `complete`
    /// guarantees the next submission can be accepted.
    pub fn submit<F>(&self, operation: F) -> Submission
    where
        F: FnOnce(&EventSink) -> anyhow::Result<()> + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Submission rejected: worker already active");
            return Submission::Busy;
        }

        let (tx, rx) = unbounded_channel();
        let busy = Arc::clone(&self.busy);

        let handle = tokio::task::spawn_blocking(move || {
            match catch_unwind(AssertUnwindSafe(|| operation(&tx))) {
                Ok(Ok(())) => {},
                Ok(Err(e)) => {
                    error!(error = %e, "Worker operation failed");
                    emit(&tx, StatusEvent::error(format!("Operation failed: {:#}", e)));
                },
                Err(payload) => {
                    let message = panic_message(payload);
                    error!(panic = %message, "Worker operation panicked");
                    emit(
                        &tx,
                        StatusEvent::error(format!("Unexpected error: {}", message)),
                    );
                },
            }

            busy.store(false, Ordering::Release);
            emit(&tx, StatusEvent::complete("Operation complete"));
        });

        Submission::Accepted { events: rx, handle }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
