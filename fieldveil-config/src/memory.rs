//! In-memory config feed.
//!
//! A mutable fixture store, used by unit tests and development setups. The
//! store counts loads and can be told to fail, so cache and reload behavior
//! is observable from tests.

use crate::error::{ConfigError, ConfigResult};
use crate::loader::{ConfigLoader, ContextRow, FieldRuleRow, SortRuleRow, TransformRow};
use fieldveil_types::ProfileId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Store {
    rules: HashMap<ProfileId, Vec<FieldRuleRow>>,
    sort_rules: HashMap<ProfileId, SortRuleRow>,
    contexts: Vec<ContextRow>,
    transforms: Vec<TransformRow>,
}

/// In-memory `ConfigLoader` backed by mutable fixture maps.
#[derive(Default)]
pub struct InMemoryLoader {
    store: Mutex<Store>,
    rule_loads: AtomicUsize,
    definition_loads: AtomicUsize,
    fail_rules: AtomicBool,
    fail_sort: AtomicBool,
    fail_definitions: AtomicBool,
}

impl InMemoryLoader {
    /// Creates an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the field rules of a profile.
    pub fn put_rules(&self, profile_id: impl Into<ProfileId>, rows: Vec<FieldRuleRow>) {
        self.store
            .lock()
            .unwrap()
            .rules
            .insert(profile_id.into(), rows);
    }

    /// Sets the sort rule of a profile.
    pub fn put_sort_rule(&self, profile_id: impl Into<ProfileId>, row: SortRuleRow) {
        self.store
            .lock()
            .unwrap()
            .sort_rules
            .insert(profile_id.into(), row);
    }

    /// Adds a library context definition.
    pub fn put_context(&self, row: ContextRow) {
        self.store.lock().unwrap().contexts.push(row);
    }

    /// Adds a transform definition.
    pub fn put_transform(&self, row: TransformRow) {
        self.store.lock().unwrap().transforms.push(row);
    }

    /// Removes a transform definition.
    pub fn remove_transform(&self, transform_id: &str) {
        self.store
            .lock()
            .unwrap()
            .transforms
            .retain(|row| row.transform_id.as_str() != transform_id);
    }

    /// Removes every context and transform definition.
    pub fn clear_definitions(&self) {
        let mut store = self.store.lock().unwrap();
        store.contexts.clear();
        store.transforms.clear();
    }

    /// Number of field-rule loads served so far.
    pub fn rule_loads(&self) -> usize {
        self.rule_loads.load(Ordering::SeqCst)
    }

    /// Number of context/transform definition loads served so far.
    pub fn definition_loads(&self) -> usize {
        self.definition_loads.load(Ordering::SeqCst)
    }

    /// Makes subsequent field-rule loads fail.
    pub fn set_fail_rules(&self, fail: bool) {
        self.fail_rules.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent sort-rule loads fail.
    pub fn set_fail_sort(&self, fail: bool) {
        self.fail_sort.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent context/transform definition loads fail.
    pub fn set_fail_definitions(&self, fail: bool) {
        self.fail_definitions.store(fail, Ordering::SeqCst);
    }
}

impl ConfigLoader for InMemoryLoader {
    fn load_field_rules(&self, profile_id: &ProfileId) -> ConfigResult<Vec<FieldRuleRow>> {
        if self.fail_rules.load(Ordering::SeqCst) {
            return Err(ConfigError::Feed("field rule feed down".to_string()));
        }
        self.rule_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .store
            .lock()
            .unwrap()
            .rules
            .get(profile_id)
            .cloned()
            .unwrap_or_default())
    }

    fn load_sort_rule(&self, profile_id: &ProfileId) -> ConfigResult<Option<SortRuleRow>> {
        if self.fail_sort.load(Ordering::SeqCst) {
            return Err(ConfigError::Feed("sort rule feed down".to_string()));
        }
        Ok(self
            .store
            .lock()
            .unwrap()
            .sort_rules
            .get(profile_id)
            .cloned())
    }

    fn load_library_contexts(&self) -> ConfigResult<Vec<ContextRow>> {
        if self.fail_definitions.load(Ordering::SeqCst) {
            return Err(ConfigError::Feed("context feed down".to_string()));
        }
        self.definition_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.lock().unwrap().contexts.clone())
    }

    fn load_transform_definitions(&self) -> ConfigResult<Vec<TransformRow>> {
        if self.fail_definitions.load(Ordering::SeqCst) {
            return Err(ConfigError::Feed("transform feed down".to_string()));
        }
        Ok(self.store.lock().unwrap().transforms.clone())
    }
}
