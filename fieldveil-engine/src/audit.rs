//! Audit sinks.
//!
//! The engine emits exactly one `AuditEvent` per rule application. Sinks are
//! fire-and-forget: a sink that cannot deliver logs locally and never fails
//! the transform.

use fieldveil_types::AuditEvent;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Receives one event per rule application.
pub trait AuditSink: Send + Sync {
    /// Delivers one event. Must not block on slow consumers.
    fn emit(&self, event: &AuditEvent);
}

/// Sink that writes each event as a structured log record.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    /// Creates the sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: &AuditEvent) {
        info!(
            event_id = %event.id,
            profile_id = %event.profile_id,
            path = %event.path,
            operation = %event.operation,
            outcome = ?event.outcome,
            message = event.message.as_deref().unwrap_or(""),
            "audit"
        );
    }
}

/// Sink that forwards events over a channel to an external forwarder
/// (typically a message-bus producer owned by the embedder).
pub struct ChannelAuditSink {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl ChannelAuditSink {
    /// Creates the sink and the receiving end the forwarder drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuditEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AuditSink for ChannelAuditSink {
    fn emit(&self, event: &AuditEvent) {
        if let Err(error) = self.tx.send(event.clone()) {
            // Forwarder gone; the event is logged here and dropped.
            warn!(%error, event_id = %error.0.id, "audit forwarder unavailable, event dropped");
        }
    }
}

/// Collecting sink for tests and embedders that assert on emissions.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of events emitted so far.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns true when nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    /// Drops collected events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
