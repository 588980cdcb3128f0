//! The transform engine.
//!
//! Applies a profile's field rules to a mutable document, one rule at a
//! time, in declared order. A rule failure is reported and audited but never
//! aborts the remaining rules. Exactly one audit event is emitted per rule
//! application, carrying the declared dotted path, never concrete leaf
//! pointers, never field values.

use crate::audit::AuditSink;
use crate::error::EngineError;
use crate::lifecycle::HandleProvider;
use crate::resolve::resolve;
use fieldveil_crypto::CheckedOutHandle;
use fieldveil_types::{AuditEvent, FieldPath, FieldRule, Operation, ProfileConfig, TransformId};
use serde_json::Value;
use std::error::Error as _;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};

/// What one `apply_profile` call did.
#[derive(Debug, Default)]
pub struct TransformReport {
    /// Rules that resolved at least one leaf and applied cleanly.
    pub rules_applied: usize,
    /// Rules that resolved zero leaves (quiet success).
    pub rules_quiet: usize,
    /// Rules that failed; the rest of the document was still processed.
    pub failures: Vec<RuleFailure>,
}

impl TransformReport {
    /// Returns true when every rule settled without failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One failed rule application.
#[derive(Debug)]
pub struct RuleFailure {
    /// The rule's declared path.
    pub path: FieldPath,
    /// The transform the rule asked for.
    pub transform_id: TransformId,
    /// What went wrong.
    pub error: EngineError,
}

enum RuleOutcome {
    Applied,
    Quiet,
}

/// Applies field rules to documents via handles from a `HandleProvider`.
pub struct TransformEngine {
    provider: Arc<HandleProvider>,
    audit: Arc<dyn AuditSink>,
}

impl TransformEngine {
    /// Creates an engine.
    #[must_use]
    pub fn new(provider: Arc<HandleProvider>, audit: Arc<dyn AuditSink>) -> Self {
        Self { provider, audit }
    }

    /// Applies every rule of the profile, in declared order.
    pub fn apply_profile(&self, doc: &mut Value, config: &ProfileConfig) -> TransformReport {
        let mut report = TransformReport::default();

        for rule in &config.rules {
            match self.apply_rule(doc, rule) {
                Ok(RuleOutcome::Applied) => {
                    report.rules_applied += 1;
                    self.audit.emit(&AuditEvent::success(
                        config.profile_id.clone(),
                        rule.path.clone(),
                        rule.operation,
                    ));
                }
                Ok(RuleOutcome::Quiet) => {
                    report.rules_quiet += 1;
                    self.audit.emit(&AuditEvent::success(
                        config.profile_id.clone(),
                        rule.path.clone(),
                        rule.operation,
                    ));
                }
                Err(error) => {
                    self.audit.emit(&AuditEvent::failure(
                        config.profile_id.clone(),
                        rule.path.clone(),
                        rule.operation,
                        error_chain(&error),
                    ));
                    warn!(
                        profile_id = %config.profile_id,
                        path = %rule.path,
                        transform_id = %rule.transform_id,
                        error = %error,
                        "rule application failed"
                    );
                    report.failures.push(RuleFailure {
                        path: rule.path.clone(),
                        transform_id: rule.transform_id.clone(),
                        error,
                    });
                }
            }
        }

        report
    }

    /// Applies one rule: resolve leaves, check out one handle, rewrite each
    /// leaf in place.
    fn apply_rule(&self, doc: &mut Value, rule: &FieldRule) -> Result<RuleOutcome, EngineError> {
        let leaves = resolve(doc, &rule.path);
        if leaves.is_empty() {
            debug!(path = %rule.path, "path resolved no leaves, nothing to transform");
            return Ok(RuleOutcome::Quiet);
        }

        let mut handle = self.checkout(&rule.transform_id)?;

        for pointer in &leaves {
            // Resolution never mutates and leaves address disjoint scalars,
            // so every pointer is still valid here.
            let Some(slot) = doc.pointer_mut(pointer) else {
                continue;
            };
            let text = match slot {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    warn!(path = %rule.path, value = %other, "skipped non-transformable leaf");
                    continue;
                }
            };

            // The first cipher failure aborts this rule; leaves already
            // rewritten stay rewritten.
            let output = match rule.operation {
                Operation::Protect => handle.protect(&text),
                Operation::Access => handle.access(&text),
                Operation::Mask => handle.masked_access(&text),
            }
            .map_err(|source| EngineError::Crypto {
                transform_id: rule.transform_id.clone(),
                source,
            })?;

            *slot = Value::String(output);
        }

        Ok(RuleOutcome::Applied)
    }

    /// Checks out a handle, attempting one targeted repair when the
    /// transform is unknown to the live set.
    fn checkout(&self, transform_id: &TransformId) -> Result<CheckedOutHandle, EngineError> {
        let set = self.provider.current();
        if let Ok(handle) = set.checkout(transform_id) {
            return Ok(handle);
        }

        debug!(transform_id = %transform_id, "handle missing from live set, attempting repair");
        if self.provider.repair(transform_id) {
            if let Ok(handle) = self.provider.current().checkout(transform_id) {
                return Ok(handle);
            }
        }
        Err(EngineError::HandleUnavailable(transform_id.clone()))
    }
}

/// Flattens an error and its causes into one diagnostic line.
fn error_chain(error: &EngineError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(message, ": {cause}");
        source = cause.source();
    }
    message
}
