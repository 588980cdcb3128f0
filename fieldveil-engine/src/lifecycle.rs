//! Handle provider and reload coordination.
//!
//! The provider owns the published `Arc<HandleSet>`. A rebuild constructs a
//! complete new set off to the side and swaps it in atomically; requests
//! already holding a checked-out handle keep the old set alive until they
//! finish, so a reload never invalidates a handle mid-use. Disposal order
//! inside a dropped set is handles first, then contexts.

use crate::error::ReloadError;
use fieldveil_config::ConfigLoader;
use fieldveil_crypto::{
    AtRestCodec, ContextParams, CryptoProvider, CryptoResult, HandleEntry, HandleMaterial,
    HandleSet, LibraryContext,
};
use fieldveil_types::{ContextId, TransformId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::{error, info, warn};

/// Lifecycle state of the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// No set has been built yet; the published set is empty.
    Uninitialized,
    /// A built set is published and serving.
    Ready,
    /// A rebuild is in flight; the previous set keeps serving.
    Reloading,
    /// The provider was shut down; the published set is empty for good.
    Disposed,
}

/// Counts from one full rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadReport {
    /// Generation of the published set.
    pub generation: u64,
    /// Library contexts built.
    pub contexts_built: usize,
    /// Library contexts that failed to build (skipped).
    pub contexts_failed: usize,
    /// Transform handles built.
    pub handles_built: usize,
    /// Transform handles that failed to build (skipped).
    pub handles_failed: usize,
}

/// Result of asking for a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new set was built and published.
    Completed(ReloadReport),
    /// Another reload was already in flight; nothing was done.
    SkippedInProgress,
}

/// Tuning knobs for the scheduled reload.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Period between scheduled full reloads.
    pub period: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(5 * 60 * 60),
        }
    }
}

/// Owns the live handle set and coordinates rebuilds.
pub struct HandleProvider {
    crypto: Arc<dyn CryptoProvider>,
    loader: Arc<dyn ConfigLoader>,
    codec: Arc<AtRestCodec>,
    live: RwLock<Arc<HandleSet>>,
    state: Mutex<ProviderState>,
    /// Serializes rebuilds (full reloads and targeted repairs). Taken with
    /// try_lock so a second caller observes the in-flight rebuild instead of
    /// queueing behind it.
    rebuild: Mutex<()>,
    generation: AtomicU64,
}

impl HandleProvider {
    /// Creates a provider with an empty published set.
    #[must_use]
    pub fn new(
        crypto: Arc<dyn CryptoProvider>,
        loader: Arc<dyn ConfigLoader>,
        codec: Arc<AtRestCodec>,
    ) -> Self {
        Self {
            crypto,
            loader,
            codec,
            live: RwLock::new(Arc::new(HandleSet::empty(0))),
            state: Mutex::new(ProviderState::Uninitialized),
            rebuild: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the currently published set.
    pub fn current(&self) -> Arc<HandleSet> {
        Arc::clone(&self.live.read().unwrap())
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> ProviderState {
        *self.state.lock().unwrap()
    }

    /// First build. Blocks until done; fails without publishing anything if
    /// the feed is unreachable.
    pub fn initialize(&self) -> Result<ReloadReport, ReloadError> {
        let _guard = self.rebuild.lock().unwrap();
        if self.state() == ProviderState::Disposed {
            return Err(ReloadError::Disposed);
        }
        let (set, report) = self.build_set()?;
        self.publish(set, ProviderState::Ready);
        info!(
            generation = report.generation,
            handles = report.handles_built,
            "handle provider initialized"
        );
        Ok(report)
    }

    /// Full rebuild: construct a new, independent set from current
    /// configuration, publish it atomically, let the old one dispose when
    /// its last holder drops.
    ///
    /// A reload arriving while one is in flight returns
    /// `SkippedInProgress` without blocking. A feed failure fails this
    /// attempt only; the previous set stays live.
    pub fn reload(&self) -> Result<ReloadOutcome, ReloadError> {
        let Ok(_guard) = self.rebuild.try_lock() else {
            info!("reload already in flight, skipping");
            return Ok(ReloadOutcome::SkippedInProgress);
        };

        let previous_state = self.state();
        if previous_state == ProviderState::Disposed {
            return Err(ReloadError::Disposed);
        }
        self.set_state(ProviderState::Reloading);

        match self.build_set() {
            Ok((set, report)) => {
                self.publish(set, ProviderState::Ready);
                info!(
                    generation = report.generation,
                    contexts = report.contexts_built,
                    contexts_failed = report.contexts_failed,
                    handles = report.handles_built,
                    handles_failed = report.handles_failed,
                    "handle set reloaded"
                );
                Ok(ReloadOutcome::Completed(report))
            }
            Err(err) => {
                // The previous set was never touched; keep serving it.
                self.set_state(previous_state);
                error!(error = %err, "reload failed, previous handle set remains live");
                Err(err)
            }
        }
    }

    /// Targeted lazy repair: build just one missing handle against a context
    /// from the current set and publish a copy-on-write set containing it.
    ///
    /// Returns false when the definition or its context is missing, the feed
    /// is unreachable, or a full rebuild currently holds the lock; in all
    /// of those cases the next full reload owns the fix.
    pub fn repair(&self, transform_id: &TransformId) -> bool {
        let Ok(_guard) = self.rebuild.try_lock() else {
            return false;
        };
        if self.state() == ProviderState::Disposed {
            return false;
        }

        let rows = match self.loader.load_transform_definitions() {
            Ok(rows) => rows,
            Err(err) => {
                warn!(transform_id = %transform_id, error = %err, "repair: definition feed unreachable");
                return false;
            }
        };
        let Some(row) = rows.into_iter().find(|row| &row.transform_id == transform_id) else {
            warn!(transform_id = %transform_id, "repair: no definition in feed");
            return false;
        };

        let current = self.current();
        let Some(context) = current.context(&row.context_id) else {
            warn!(
                transform_id = %transform_id,
                context_id = %row.context_id,
                "repair: context not in live set"
            );
            return false;
        };

        let entry = match self.build_entry(context, &row.context_id, &row.format, &row.shared_secret, &row.identity) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(transform_id = %transform_id, error = %err, "repair: handle build failed");
                return false;
            }
        };

        let mut entries = current.entries_cloned();
        entries.insert(transform_id.clone(), entry);
        let set = HandleSet::new(current.generation(), current.contexts_cloned(), entries);
        *self.live.write().unwrap() = Arc::new(set);
        info!(transform_id = %transform_id, "handle repaired into live set");
        true
    }

    /// Publishes an empty set and refuses further rebuilds. In-flight
    /// holders of the old set finish normally.
    pub fn dispose(&self) {
        let _guard = self.rebuild.lock().unwrap();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish(HandleSet::empty(generation), ProviderState::Disposed);
        info!("handle provider disposed");
    }

    fn set_state(&self, state: ProviderState) {
        *self.state.lock().unwrap() = state;
    }

    fn publish(&self, set: HandleSet, state: ProviderState) {
        *self.live.write().unwrap() = Arc::new(set);
        self.set_state(state);
    }

    /// Builds a complete new set from the feed. A feed failure fails the
    /// build; a single context or handle failure is recoverable: that
    /// entry is skipped with a warning and its rules degrade to
    /// skip-with-warning at apply time.
    fn build_set(&self) -> Result<(HandleSet, ReloadReport), ReloadError> {
        let context_rows = self.loader.load_library_contexts()?;
        let transform_rows = self.loader.load_transform_definitions()?;

        let mut contexts: HashMap<ContextId, Arc<dyn LibraryContext>> = HashMap::new();
        let mut contexts_failed = 0usize;
        for row in context_rows {
            match self.build_context(&row.context_id, &row.policy_ref, &row.trust_anchor, &row.client_identity) {
                Ok(context) => {
                    contexts.insert(row.context_id, context);
                }
                Err(err) => {
                    warn!(context_id = %row.context_id, error = %err, "context build failed, skipped");
                    contexts_failed += 1;
                }
            }
        }

        let mut entries: BTreeMap<TransformId, HandleEntry> = BTreeMap::new();
        let mut handles_failed = 0usize;
        for row in transform_rows {
            let Some(context) = contexts.get(&row.context_id) else {
                warn!(
                    transform_id = %row.transform_id,
                    context_id = %row.context_id,
                    "transform references unknown context, skipped"
                );
                handles_failed += 1;
                continue;
            };
            match self.build_entry(context, &row.context_id, &row.format, &row.shared_secret, &row.identity) {
                Ok(entry) => {
                    entries.insert(row.transform_id, entry);
                }
                Err(err) => {
                    warn!(transform_id = %row.transform_id, error = %err, "handle build failed, skipped");
                    handles_failed += 1;
                }
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let report = ReloadReport {
            generation,
            contexts_built: contexts.len(),
            contexts_failed,
            handles_built: entries.len(),
            handles_failed,
        };
        Ok((HandleSet::new(generation, contexts, entries), report))
    }

    fn build_context(
        &self,
        context_id: &ContextId,
        policy_ref: &str,
        trust_anchor: &str,
        client_identity: &str,
    ) -> CryptoResult<Arc<dyn LibraryContext>> {
        let policy_ref = self.codec.reveal(policy_ref)?;
        self.crypto.new_context(&ContextParams {
            context_id: context_id.clone(),
            policy_ref,
            trust_anchor: trust_anchor.to_owned(),
            client_identity: client_identity.to_owned(),
        })
    }

    fn build_entry(
        &self,
        context: &Arc<dyn LibraryContext>,
        context_id: &ContextId,
        format: &str,
        shared_secret: &str,
        identity: &str,
    ) -> CryptoResult<HandleEntry> {
        let material = HandleMaterial::new(
            self.codec.reveal(format)?,
            self.codec.reveal(shared_secret)?,
            self.codec.reveal(identity)?,
        );
        let factory = context.new_handle(&material)?;
        Ok(HandleEntry {
            factory,
            context_id: context_id.clone(),
        })
    }
}

/// Runs `reload()` every `period` on a background task.
///
/// The rebuild is synchronous and feed-bound, so it runs on the blocking
/// pool. A failed attempt is logged and the schedule keeps going; the task
/// ends when the provider is disposed. The manual trigger and this schedule
/// share the same `reload()` entry point.
pub fn spawn_reload_schedule(
    provider: Arc<HandleProvider>,
    config: ScheduleConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the schedule starts one
        // period out.
        interval.tick().await;

        loop {
            interval.tick().await;
            if provider.state() == ProviderState::Disposed {
                info!("provider disposed, reload schedule stopping");
                break;
            }
            let provider = Arc::clone(&provider);
            match tokio::task::spawn_blocking(move || provider.reload()).await {
                Ok(Ok(ReloadOutcome::Completed(report))) => {
                    info!(generation = report.generation, "scheduled reload completed");
                }
                Ok(Ok(ReloadOutcome::SkippedInProgress)) => {
                    info!("scheduled reload skipped, another reload in flight");
                }
                Ok(Err(err)) => {
                    error!(error = %err, "scheduled reload failed, will retry next period");
                }
                Err(err) => {
                    error!(error = %err, "scheduled reload task panicked");
                }
            }
        }
    })
}
