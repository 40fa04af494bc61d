//! Status events streamed from the worker to the consumer
//!
//! Events are ephemeral: they exist only on the channel between the active
//! worker and whichever front end is draining it. The worker is the single
//! producer, the front end the single consumer, and the channel preserves
//! production order.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Severity tag attached to every status event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
    /// Terminal event of a worker run; the busy flag is already cleared
    /// when this is observed
    Complete,
    /// Aggregate counts for a finished batch
    Summary,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Complete => write!(f, "complete"),
            Severity::Summary => write!(f, "summary"),
        }
    }
}

/// One message on the worker→consumer channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub message: String,
    pub severity: Severity,
}

impl StatusEvent {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Complete)
    }

    pub fn summary(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Summary)
    }
}

/// Sending half of the event channel handed to pipeline operations
pub type EventSink = UnboundedSender<StatusEvent>;

/// Push an event, ignoring a dropped consumer
///
/// A worker runs to completion even when nobody is draining the channel;
/// there is no cancellation path.
pub fn emit(sink: &EventSink, event: StatusEvent) {
    let _ = sink.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Complete).unwrap();
        assert_eq!(json, "\"complete\"");
    }

    #[test]
    fn test_emit_survives_dropped_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        emit(&tx, StatusEvent::info("nobody listening"));
    }
}
