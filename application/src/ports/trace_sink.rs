//! Port for structured run-trace logging.
//!
//! Separate from `tracing`-based operation logs: tracing carries
//! human-readable diagnostics, while this port captures the machine-readable
//! audit trail of a session (turns, steps, termination) for post-hoc replay.

use serde_json::Value;

/// A structured trace event for logging.
pub struct TraceEvent {
    /// Event type identifier (e.g., "run_started", "step", "run_finished").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl TraceEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for recording trace events.
///
/// `record` is synchronous and non-fallible; implementations swallow their
/// own I/O errors so logging never disturbs the run.
pub trait TraceSink: Send + Sync {
    fn record(&self, event: TraceEvent);
}

/// No-op implementation for tests and when trace logging is disabled.
pub struct NoTraceSink;

impl TraceSink for NoTraceSink {
    fn record(&self, _event: TraceEvent) {}
}
