//! The transform service facade.
//!
//! Wires cache, engine, provider and sorter together behind the two calls
//! an embedder makes per request: `transform` for raw bodies and
//! `transform_value` for parsed documents.

use crate::audit::AuditSink;
use crate::engine::{TransformEngine, TransformReport};
use crate::error::ReloadError;
use crate::lifecycle::{HandleProvider, ReloadOutcome};
use crate::sort::sort_by_field;
use fieldveil_config::ConfigCache;
use fieldveil_types::ProfileId;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// What `transform` returned: the (possibly rewritten) body and, when a
/// profile actually ran, the engine's report.
#[derive(Debug)]
pub struct ServiceOutcome {
    /// The document to hand back to the caller.
    pub body: String,
    /// Per-rule accounting; `None` means the body passed through untouched.
    pub report: Option<TransformReport>,
}

/// Facade over cache + engine + provider + sorter.
pub struct TransformService {
    cache: Arc<ConfigCache>,
    provider: Arc<HandleProvider>,
    engine: TransformEngine,
}

impl TransformService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        cache: Arc<ConfigCache>,
        provider: Arc<HandleProvider>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let engine = TransformEngine::new(Arc::clone(&provider), audit);
        Self {
            cache,
            provider,
            engine,
        }
    }

    /// Transforms a raw request body under the given profile.
    ///
    /// Bodies that are empty, whitespace, the `null` literal, exactly `{}`
    /// or `[{}]`, or unparsable JSON pass through byte-for-byte rather than
    /// erroring. So does any body whose profile is unknown or whose config
    /// feed is down.
    pub fn transform(&self, profile_id: &ProfileId, body: &str) -> ServiceOutcome {
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" || trimmed == "{}" || trimmed == "[{}]" {
            return Self::passthrough(body);
        }

        let mut doc: Value = match serde_json::from_str(body) {
            Ok(doc) => doc,
            Err(error) => {
                warn!(profile_id = %profile_id, %error, "unparsable body passed through");
                return Self::passthrough(body);
            }
        };

        let Some(report) = self.transform_value(profile_id, &mut doc) else {
            return Self::passthrough(body);
        };

        match serde_json::to_string(&doc) {
            Ok(body) => ServiceOutcome {
                body,
                report: Some(report),
            },
            Err(error) => {
                warn!(profile_id = %profile_id, %error, "reserialization failed, body passed through");
                Self::passthrough(body)
            }
        }
    }

    /// Transforms a parsed document under the given profile, then sorts a
    /// top-level array output when the profile asks for it.
    ///
    /// Returns `None` (document untouched) when the profile has no config
    /// or the config feed errored.
    pub fn transform_value(
        &self,
        profile_id: &ProfileId,
        doc: &mut Value,
    ) -> Option<TransformReport> {
        let config = match self.cache.get(profile_id) {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!(profile_id = %profile_id, "no profile config, nothing to transform");
                return None;
            }
            Err(error) => {
                warn!(profile_id = %profile_id, %error, "config load failed, document passed through");
                return None;
            }
        };

        let report = self.engine.apply_profile(doc, &config);

        // Sorting runs after every rule, so a protected sort field orders by
        // its ciphertext.
        if let Some(sort) = config.active_sort_rule() {
            sort_by_field(doc, &sort.field, sort.direction);
        }

        Some(report)
    }

    /// Health check: protects a sample value with the first available
    /// handle. `None` means no handle is live or the operation failed.
    pub fn probe(&self, sample: &str) -> Option<String> {
        let set = self.provider.current();
        let transform_id = set.transform_ids().next()?.clone();
        let mut handle = set.checkout(&transform_id).ok()?;
        handle.protect(sample).ok()
    }

    /// Invalidates the config cache wholesale and rebuilds the handle set.
    /// Manual trigger and schedule share the provider's reload entry point.
    pub fn reload(&self) -> Result<ReloadOutcome, ReloadError> {
        self.cache.invalidate_all();
        self.provider.reload()
    }

    fn passthrough(body: &str) -> ServiceOutcome {
        ServiceOutcome {
            body: body.to_owned(),
            report: None,
        }
    }
}
