//! Expiring profile config cache.
//!
//! Profiles are loaded lazily on first use and kept for a sliding idle
//! window. Entries are immutable `Arc<ProfileConfig>` values; refreshing an
//! entry inserts a brand-new value, so a holder of the old one never
//! observes a partial update. Loads happen outside the map lock, so two
//! concurrent misses for the same profile may both hit the feed; the
//! duplicate work is bounded and the last write wins.

use crate::error::{ConfigError, ConfigResult};
use crate::loader::ConfigLoader;
use fieldveil_crypto::AtRestCodec;
use fieldveil_types::{FieldRule, ProfileConfig, ProfileId, SortRule};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tuning knobs for the config cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Sliding idle expiry: an entry untouched for this long is reloaded on
    /// its next access.
    pub idle_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(300),
        }
    }
}

struct CacheEntry {
    value: Arc<ProfileConfig>,
    last_access: Instant,
}

/// Sliding-expiry cache of assembled profile configs.
///
/// At-rest-encrypted feed columns are revealed exactly once per load, never
/// per access.
pub struct ConfigCache {
    loader: Arc<dyn ConfigLoader>,
    codec: Arc<AtRestCodec>,
    config: CacheConfig,
    entries: Mutex<HashMap<ProfileId, CacheEntry>>,
}

impl ConfigCache {
    /// Creates a cache over the given feed and codec.
    #[must_use]
    pub fn new(loader: Arc<dyn ConfigLoader>, codec: Arc<AtRestCodec>, config: CacheConfig) -> Self {
        Self {
            loader,
            codec,
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the profile's config, loading it on miss or after expiry.
    ///
    /// `Ok(None)` means the feed has no rules for this profile; such results
    /// are never cached, so a profile created later becomes visible without
    /// waiting for expiry.
    pub fn get(&self, profile_id: &ProfileId) -> ConfigResult<Option<Arc<ProfileConfig>>> {
        {
            let mut entries = self.entries.lock().unwrap();
            if let Some(entry) = entries.get_mut(profile_id) {
                if entry.last_access.elapsed() < self.config.idle_ttl {
                    entry.last_access = Instant::now();
                    return Ok(Some(Arc::clone(&entry.value)));
                }
                entries.remove(profile_id);
            }
        }

        let Some(config) = self.load(profile_id)? else {
            debug!(profile_id = %profile_id, "no field rules in feed, nothing cached");
            return Ok(None);
        };

        let value = Arc::new(config);
        self.entries.lock().unwrap().insert(
            profile_id.clone(),
            CacheEntry {
                value: Arc::clone(&value),
                last_access: Instant::now(),
            },
        );
        Ok(Some(value))
    }

    /// Drops every entry; the next `get` for any profile loads fresh.
    pub fn invalidate_all(&self) {
        self.entries.lock().unwrap().clear();
        debug!("config cache invalidated");
    }

    /// Sweeps entries whose idle window has elapsed.
    pub fn purge_expired(&self) {
        let ttl = self.config.idle_ttl;
        self.entries
            .lock()
            .unwrap()
            .retain(|_, entry| entry.last_access.elapsed() < ttl);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Returns true when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Loads and assembles one profile from the feed, revealing encrypted
    /// columns as it goes.
    fn load(&self, profile_id: &ProfileId) -> ConfigResult<Option<ProfileConfig>> {
        let rows = self.loader.load_field_rules(profile_id)?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            let path = self
                .codec
                .reveal(&row.path)
                .map_err(|source| ConfigError::AtRest {
                    column: "field_rule.path",
                    source,
                })?;
            rules.push(FieldRule::new(path, row.operation, row.transform_id));
        }

        // A failed sort lookup degrades to no sorting; the transforms still
        // run.
        let sort_rule = match self.loader.load_sort_rule(profile_id) {
            Ok(Some(row)) => match self.codec.reveal(&row.field) {
                Ok(field) => Some(SortRule {
                    enabled: row.enabled,
                    field,
                    direction: row.direction,
                }),
                Err(error) => {
                    warn!(profile_id = %profile_id, %error, "sort key failed to decrypt, sorting disabled");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                warn!(profile_id = %profile_id, %error, "sort rule load failed, sorting disabled");
                None
            }
        };

        debug!(
            profile_id = %profile_id,
            rules = rules.len(),
            sorted = sort_rule.is_some(),
            "profile config loaded"
        );
        Ok(Some(ProfileConfig::new(
            profile_id.clone(),
            rules,
            sort_rule,
        )))
    }
}
