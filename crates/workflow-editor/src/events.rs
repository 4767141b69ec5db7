//! Event types for streaming run progress
//!
//! Events are sent from the run driver to the host (or any consumer) as each
//! node changes status, mirroring what the tracker records.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::execution::RunOutcome;

/// Trait for sending run events
///
/// This abstracts over the transport mechanism (UI channel, mpsc, etc.)
/// so the driver can be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g., channel closed)
    fn send(&self, event: ExecutionEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Events emitted while a run is driven
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExecutionEvent {
    #[serde(rename_all = "camelCase")]
    RunStarted { run_id: String, node_count: usize },

    #[serde(rename_all = "camelCase")]
    NodeStarted { run_id: String, node_id: String },

    #[serde(rename_all = "camelCase")]
    NodeSucceeded {
        run_id: String,
        node_id: String,
        output: serde_json::Value,
    },

    #[serde(rename_all = "camelCase")]
    NodeFailed {
        run_id: String,
        node_id: String,
        error: String,
    },

    /// A node will not run because an earlier node failed
    #[serde(rename_all = "camelCase")]
    NodeSkipped { run_id: String, node_id: String },

    #[serde(rename_all = "camelCase")]
    RunFinished { run_id: String, outcome: RunOutcome },
}

impl ExecutionEvent {
    /// The run this event belongs to
    pub fn run_id(&self) -> &str {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::NodeStarted { run_id, .. }
            | Self::NodeSucceeded { run_id, .. }
            | Self::NodeFailed { run_id, .. }
            | Self::NodeSkipped { run_id, .. }
            | Self::RunFinished { run_id, .. } => run_id,
        }
    }
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: ExecutionEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: ExecutionEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();
        sink.send(ExecutionEvent::NodeStarted {
            run_id: "r1".into(),
            node_id: "n1".into(),
        })
        .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].run_id(), "r1");

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_event_sink() {
        let sink = NullEventSink;
        // Should not panic
        sink.send(ExecutionEvent::RunStarted {
            run_id: "r1".into(),
            node_count: 0,
        })
        .unwrap();
    }

    #[test]
    fn test_event_wire_format() {
        let event = ExecutionEvent::NodeFailed {
            run_id: "r1".into(),
            node_id: "n2".into(),
            error: "timeout".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "nodeFailed");
        assert_eq!(json["nodeId"], "n2");
    }
}
