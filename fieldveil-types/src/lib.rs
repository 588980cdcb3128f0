//! Core type definitions for Fieldveil.
//!
//! This crate defines the fundamental, provider-agnostic types used
//! throughout the protection core:
//! - Profile, transform and library-context identifiers
//! - Field rules (dotted path + operation + transform id) and sort rules
//! - The assembled per-profile configuration
//! - Audit events emitted once per rule application
//!
//! Anything that touches a crypto library, a config feed or a JSON document
//! belongs in the layers above, not here.

mod audit;
mod ids;
mod profile;
mod rule;

pub use audit::{AuditEvent, AuditEventId, AuditOutcome};
pub use ids::{ContextId, ProfileId, TransformId};
pub use profile::ProfileConfig;
pub use rule::{FieldPath, FieldRule, Operation, SortDirection, SortRule};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation column held something other than the three wire names.
    #[error("unknown operation `{0}` (expected encrypt, decrypt or mask)")]
    InvalidOperation(String),

    /// A sort direction column held something other than ASC or DESC.
    #[error("unknown sort direction `{0}` (expected ASC or DESC)")]
    InvalidSortDirection(String),
}
