//! The crypto capability seam.
//!
//! The engine never talks to a crypto library directly; it depends on these
//! object-safe traits. The real format-preserving library lives behind a
//! `CryptoProvider` implementation supplied by the embedder; this crate ships
//! `ReferenceCryptoProvider` for development and tests.

use crate::error::CryptoResult;
use fieldveil_types::ContextId;
use std::fmt;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Parameters for constructing a library context.
#[derive(Debug, Clone)]
pub struct ContextParams {
    /// Identifier of the context in the registry.
    pub context_id: ContextId,
    /// Policy endpoint or policy document reference.
    pub policy_ref: String,
    /// Trust anchor (CA bundle reference or pinned roots).
    pub trust_anchor: String,
    /// Client identity presented to the policy endpoint.
    pub client_identity: String,
}

/// Credentials and format for one transform handle.
///
/// The shared secret is zeroized when the material is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HandleMaterial {
    /// Format descriptor the handle preserves (e.g. "ssn", "digits-9").
    pub format: String,
    /// Shared secret the handle is keyed with.
    pub shared_secret: String,
    /// Identity bound into the derivation.
    pub identity: String,
}

impl HandleMaterial {
    /// Creates handle material.
    #[must_use]
    pub fn new(
        format: impl Into<String>,
        shared_secret: impl Into<String>,
        identity: impl Into<String>,
    ) -> Self {
        Self {
            format: format.into(),
            shared_secret: shared_secret.into(),
            identity: identity.into(),
        }
    }
}

impl fmt::Debug for HandleMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleMaterial")
            .field("format", &self.format)
            .field("shared_secret", &"[REDACTED]")
            .field("identity", &self.identity)
            .finish()
    }
}

/// Entry point into a crypto library: builds library contexts.
pub trait CryptoProvider: Send + Sync {
    /// Constructs a library context under the given policy root.
    fn new_context(&self, params: &ContextParams) -> CryptoResult<Arc<dyn LibraryContext>>;
}

/// A trust/policy scope under which transform handles are derived.
///
/// A context must outlive every handle derived from it; the registry drops
/// handle entries before contexts to honor that.
pub trait LibraryContext: Send + Sync {
    /// Returns the identifier this context was built under.
    fn context_id(&self) -> &ContextId;

    /// Derives a handle factory from secret material.
    fn new_handle(&self, material: &HandleMaterial)
        -> CryptoResult<Arc<dyn TransformHandleFactory>>;
}

/// Shared, thread-safe source of per-worker transform handles.
///
/// The factory is shared across requests; the handles it checks out are not.
pub trait TransformHandleFactory: Send + Sync {
    /// Checks out a handle confined to the calling worker.
    fn checkout(&self) -> Box<dyn TransformHandle>;
}

/// A per-field cryptographic capability confined to one worker at a time.
///
/// `Send` but deliberately not `Sync`: a checked-out handle is owned by one
/// request for its lifetime.
pub trait TransformHandle: Send {
    /// Forward format-preserving cipher.
    fn protect(&mut self, text: &str) -> CryptoResult<String>;

    /// Inverse cipher.
    fn access(&mut self, text: &str) -> CryptoResult<String>;

    /// Inverse cipher followed by deterministic format-shaped redaction.
    fn masked_access(&mut self, text: &str) -> CryptoResult<String>;
}
