//! Error types for the transform engine and handle lifecycle.

use fieldveil_config::ConfigError;
use fieldveil_crypto::CryptoError;
use fieldveil_types::TransformId;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Per-rule failures inside the transform engine.
///
/// These never abort the document: a failed rule is reported and the
/// remaining rules still run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No handle is registered for the rule's transform, even after a
    /// targeted repair attempt.
    #[error("no transform handle available for `{0}`")]
    HandleUnavailable(TransformId),

    /// The underlying cipher call failed.
    #[error("crypto operation failed for `{transform_id}`")]
    Crypto {
        transform_id: TransformId,
        #[source]
        source: CryptoError,
    },
}

/// Failures of a full registry rebuild.
///
/// A failed reload leaves the previously published handle set live.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// The config feed could not be read.
    #[error("config feed unavailable")]
    Feed(#[from] ConfigError),

    /// The provider was disposed; no further rebuilds are possible.
    #[error("handle provider is disposed")]
    Disposed,
}
