//! Error types for the config layer.

use fieldveil_crypto::CryptoError;
use thiserror::Error;

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur loading or caching configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config feed is unreachable or returned a malformed response.
    #[error("config feed error: {0}")]
    Feed(String),

    /// Reading the backing file failed.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config document does not parse.
    #[error("malformed config document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An at-rest-encrypted column failed to decrypt.
    #[error("at-rest decryption failed for column `{column}`")]
    AtRest {
        column: &'static str,
        #[source]
        source: CryptoError,
    },
}
