//! The published registry of transform handles.
//!
//! A `HandleSet` is an immutable snapshot: the reload coordinator builds a
//! whole new set and swaps it in atomically, so readers never observe a
//! half-built registry. Checked-out handles keep their origin set alive,
//! which defers disposal of a replaced set until its last holder finishes.

use crate::error::{CryptoError, CryptoResult};
use crate::provider::{LibraryContext, TransformHandle, TransformHandleFactory};
use fieldveil_types::{ContextId, TransformId};
use std::collections::{BTreeMap, HashMap};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// One registered transform: its factory and the context it was built under.
#[derive(Clone)]
pub struct HandleEntry {
    /// Factory that checks out confined handles for this transform.
    pub factory: Arc<dyn TransformHandleFactory>,
    /// The context the factory was derived from.
    pub context_id: ContextId,
}

/// An immutable snapshot of every live context and transform handle factory.
///
/// Field order matters: `entries` is declared before `contexts` so handle
/// factories drop before the contexts they were derived from.
pub struct HandleSet {
    entries: BTreeMap<TransformId, HandleEntry>,
    contexts: HashMap<ContextId, Arc<dyn LibraryContext>>,
    generation: u64,
}

impl HandleSet {
    /// Assembles a snapshot from built contexts and entries.
    #[must_use]
    pub fn new(
        generation: u64,
        contexts: HashMap<ContextId, Arc<dyn LibraryContext>>,
        entries: BTreeMap<TransformId, HandleEntry>,
    ) -> Self {
        Self {
            entries,
            contexts,
            generation,
        }
    }

    /// An empty snapshot; every checkout fails with `HandleUnavailable`.
    #[must_use]
    pub fn empty(generation: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            contexts: HashMap::new(),
            generation,
        }
    }

    /// Checks out a confined handle for the given transform.
    ///
    /// The returned guard holds a strong reference to this set, so a set
    /// replaced by a reload stays alive until the last guard drops.
    pub fn checkout(self: &Arc<Self>, id: &TransformId) -> CryptoResult<CheckedOutHandle> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| CryptoError::HandleUnavailable(id.clone()))?;
        Ok(CheckedOutHandle {
            handle: entry.factory.checkout(),
            _origin: Arc::clone(self),
        })
    }

    /// Returns the context registered under `id`, if any.
    #[must_use]
    pub fn context(&self, id: &ContextId) -> Option<&Arc<dyn LibraryContext>> {
        self.contexts.get(id)
    }

    /// Returns true when a handle is registered for `id`.
    #[must_use]
    pub fn contains(&self, id: &TransformId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of registered transform handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no handles are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot generation, bumped on every full rebuild.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Registered transform ids in sorted order.
    pub fn transform_ids(&self) -> impl Iterator<Item = &TransformId> {
        self.entries.keys()
    }

    /// Clones the entry map, for copy-on-write targeted repair.
    #[must_use]
    pub fn entries_cloned(&self) -> BTreeMap<TransformId, HandleEntry> {
        self.entries.clone()
    }

    /// Clones the context map, for copy-on-write targeted repair.
    #[must_use]
    pub fn contexts_cloned(&self) -> HashMap<ContextId, Arc<dyn LibraryContext>> {
        self.contexts.clone()
    }
}

/// A confined handle checked out from a `HandleSet`.
///
/// Dereferences to `dyn TransformHandle`. Owning a guard keeps the origin
/// set (and therefore its contexts) alive.
pub struct CheckedOutHandle {
    handle: Box<dyn TransformHandle>,
    _origin: Arc<HandleSet>,
}

impl std::fmt::Debug for CheckedOutHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckedOutHandle").finish_non_exhaustive()
    }
}

impl Deref for CheckedOutHandle {
    type Target = dyn TransformHandle;

    fn deref(&self) -> &Self::Target {
        self.handle.as_ref()
    }
}

impl DerefMut for CheckedOutHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.handle.as_mut()
    }
}
