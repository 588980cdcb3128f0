//! Audit events.
//!
//! Exactly one event is emitted per rule application per request, success or
//! failure. Events carry the rule's declared dotted path, never the concrete
//! leaf pointers and never field values.

use crate::{FieldPath, Operation, ProfileId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique identifier for an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditEventId(Uuid);

impl AuditEventId {
    /// Creates a new time-ordered event ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AuditEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuditEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AuditEventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Whether a rule application settled in success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// One audit record for one rule application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this event.
    pub id: AuditEventId,

    /// When this event was created (milliseconds since Unix epoch).
    pub timestamp_ms: u64,

    /// The profile whose rule was applied.
    pub profile_id: ProfileId,

    /// The rule's declared dotted path.
    pub path: FieldPath,

    /// The operation the rule requested.
    pub operation: Operation,

    /// How the rule application settled.
    pub outcome: AuditOutcome,

    /// Diagnostic detail, present on failures and notable successes.
    pub message: Option<String>,
}

impl AuditEvent {
    /// Creates an event with the given outcome at the current time.
    #[must_use]
    pub fn new(
        profile_id: ProfileId,
        path: FieldPath,
        operation: Operation,
        outcome: AuditOutcome,
        message: Option<String>,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            timestamp_ms: epoch_millis(),
            profile_id,
            path,
            operation,
            outcome,
            message,
        }
    }

    /// Creates a success event.
    #[must_use]
    pub fn success(profile_id: ProfileId, path: FieldPath, operation: Operation) -> Self {
        Self::new(profile_id, path, operation, AuditOutcome::Success, None)
    }

    /// Creates a failure event carrying the failure reason.
    #[must_use]
    pub fn failure(
        profile_id: ProfileId,
        path: FieldPath,
        operation: Operation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            profile_id,
            path,
            operation,
            AuditOutcome::Failure,
            Some(message.into()),
        )
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before Unix epoch")
        .as_millis() as u64
}
