//! File-backed config feed.
//!
//! One JSON document holds every profile, context and transform definition.
//! The file is read per call, so an external edit becomes visible to the
//! next cache load or registry reload without restarting the process.

use crate::error::{ConfigError, ConfigResult};
use crate::loader::{ConfigLoader, ContextRow, FieldRuleRow, SortRuleRow, TransformRow};
use fieldveil_types::ProfileId;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct ProfileSection {
    #[serde(default)]
    rules: Vec<FieldRuleRow>,
    #[serde(default)]
    sort_rule: Option<SortRuleRow>,
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    profiles: HashMap<ProfileId, ProfileSection>,
    #[serde(default)]
    contexts: Vec<ContextRow>,
    #[serde(default)]
    transforms: Vec<TransformRow>,
}

/// `ConfigLoader` backed by a single JSON file.
pub struct JsonFileLoader {
    path: PathBuf,
}

impl JsonFileLoader {
    /// Creates a loader for the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> ConfigResult<ConfigDocument> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl ConfigLoader for JsonFileLoader {
    fn load_field_rules(&self, profile_id: &ProfileId) -> ConfigResult<Vec<FieldRuleRow>> {
        let mut doc = self.read()?;
        Ok(doc
            .profiles
            .remove(profile_id)
            .map(|section| section.rules)
            .unwrap_or_default())
    }

    fn load_sort_rule(&self, profile_id: &ProfileId) -> ConfigResult<Option<SortRuleRow>> {
        let mut doc = self.read()?;
        Ok(doc
            .profiles
            .remove(profile_id)
            .and_then(|section| section.sort_rule))
    }

    fn load_library_contexts(&self) -> ConfigResult<Vec<ContextRow>> {
        Ok(self.read()?.contexts)
    }

    fn load_transform_definitions(&self) -> ConfigResult<Vec<TransformRow>> {
        Ok(self.read()?.transforms)
    }
}
