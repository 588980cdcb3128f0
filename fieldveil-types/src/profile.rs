//! The assembled per-profile configuration.

use crate::{FieldRule, ProfileId, SortRule};
use serde::{Deserialize, Serialize};

/// Everything a profile tells the engine to do: the ordered field rules and
/// the optional sort rule applied after them.
///
/// Immutable after assembly. The config cache replaces whole entries rather
/// than mutating them, so holders of a `ProfileConfig` never observe a
/// partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// The profile these rules belong to.
    pub profile_id: ProfileId,

    /// Field rules in declared order; the engine applies them in this order.
    pub rules: Vec<FieldRule>,

    /// Optional ordering of a top-level array output.
    pub sort_rule: Option<SortRule>,
}

impl ProfileConfig {
    /// Creates a profile configuration.
    #[must_use]
    pub fn new(
        profile_id: impl Into<ProfileId>,
        rules: Vec<FieldRule>,
        sort_rule: Option<SortRule>,
    ) -> Self {
        Self {
            profile_id: profile_id.into(),
            rules,
            sort_rule,
        }
    }

    /// Returns the sort rule if one is present and enabled.
    #[must_use]
    pub fn active_sort_rule(&self) -> Option<&SortRule> {
        self.sort_rule.as_ref().filter(|rule| rule.enabled)
    }

    /// Returns true when the profile has no field rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
