//! The config feed seam.
//!
//! The feed hands out rows, not assembled configs: field paths, sort keys
//! and transform credentials arrive at-rest-encrypted and are revealed
//! exactly once per load (by the cache for profile rows, by the reload
//! coordinator for context/transform rows).

use crate::error::ConfigResult;
use fieldveil_types::{ContextId, Operation, ProfileId, SortDirection, TransformId};
use serde::{Deserialize, Serialize};

/// One field rule row as stored in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRuleRow {
    /// Dotted field path, at-rest-encrypted.
    pub path: String,
    /// Operation, stored in the clear.
    pub operation: Operation,
    /// Transform definition this rule uses.
    pub transform_id: TransformId,
}

/// One sort rule row as stored in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRuleRow {
    /// Whether sorting is active for the profile.
    pub enabled: bool,
    /// Dotted sort key, at-rest-encrypted.
    pub field: String,
    /// Sort direction, stored in the clear.
    pub direction: SortDirection,
}

/// One library context row as stored in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRow {
    /// Identifier of the context.
    pub context_id: ContextId,
    /// Policy reference, at-rest-encrypted.
    pub policy_ref: String,
    /// Trust anchor, stored in the clear.
    pub trust_anchor: String,
    /// Client identity, stored in the clear.
    pub client_identity: String,
}

/// One transform definition row as stored in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRow {
    /// Identifier of the transform.
    pub transform_id: TransformId,
    /// Context the handle is built under.
    pub context_id: ContextId,
    /// Format descriptor, at-rest-encrypted.
    pub format: String,
    /// Shared secret, at-rest-encrypted.
    pub shared_secret: String,
    /// Identity, at-rest-encrypted.
    pub identity: String,
}

/// The external config feed.
///
/// Implementations may hit a database, a service or a file; the core only
/// sees these four reads. All results are in feed order.
pub trait ConfigLoader: Send + Sync {
    /// Loads the field rules of one profile, in declared order.
    fn load_field_rules(&self, profile_id: &ProfileId) -> ConfigResult<Vec<FieldRuleRow>>;

    /// Loads the optional sort rule of one profile.
    fn load_sort_rule(&self, profile_id: &ProfileId) -> ConfigResult<Option<SortRuleRow>>;

    /// Loads every library context definition.
    fn load_library_contexts(&self) -> ConfigResult<Vec<ContextRow>>;

    /// Loads every transform definition.
    fn load_transform_definitions(&self) -> ConfigResult<Vec<TransformRow>>;
}
