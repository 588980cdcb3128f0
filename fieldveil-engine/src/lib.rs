//! Transform engine for Fieldveil.
//!
//! The core of the protection pipeline: dotted-path resolution over JSON
//! documents, per-rule format-preserving transforms through checked-out
//! crypto handles, handle lifecycle with atomic publish-then-dispose
//! reloads, post-transform array sorting, audit emission, and the
//! `TransformService` facade an embedder drives.

mod audit;
mod engine;
mod error;
mod lifecycle;
mod resolve;
mod service;
mod sort;

pub use audit::{AuditSink, ChannelAuditSink, MemoryAuditSink, TracingAuditSink};
pub use engine::{RuleFailure, TransformEngine, TransformReport};
pub use error::{EngineError, EngineResult, ReloadError};
pub use lifecycle::{
    spawn_reload_schedule, HandleProvider, ProviderState, ReloadOutcome, ReloadReport,
    ScheduleConfig,
};
pub use resolve::resolve;
pub use service::{ServiceOutcome, TransformService};
pub use sort::sort_by_field;
