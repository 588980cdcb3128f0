//! Error types for the crypto layer.

use fieldveil_types::TransformId;
use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Building a library context failed.
    #[error("context construction failed: {0}")]
    Context(String),

    /// Building a transform handle factory failed.
    #[error("handle construction failed: {0}")]
    Handle(String),

    /// No handle is registered for the requested transform.
    #[error("no handle registered for transform `{0}`")]
    HandleUnavailable(TransformId),

    /// A protect/access/mask call failed (bad format, corrupt ciphertext).
    #[error("transform operation failed: {0}")]
    Operation(String),

    /// At-rest encryption failed.
    #[error("at-rest encryption failed: {0}")]
    Conceal(String),

    /// At-rest decryption failed (wrong key or tampered data).
    #[error("at-rest decryption failed: {0}")]
    Reveal(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}
