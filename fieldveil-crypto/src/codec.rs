//! At-rest codec for config feed columns.
//!
//! Field paths, sort keys and transform credentials are stored encrypted in
//! the config feed. The codec is ChaCha20-Poly1305 with a random 96-bit
//! nonce, encoded as `base64(nonce || ciphertext)`.

use crate::error::{CryptoError, CryptoResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit, OsRng},
    AeadCore, ChaCha20Poly1305, Nonce,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of codec keys in bytes (256 bits for ChaCha20).
pub const CODEC_KEY_SIZE: usize = 32;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Key for the at-rest codec, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CodecKey {
    bytes: [u8; CODEC_KEY_SIZE],
}

impl CodecKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; CODEC_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Creates a key from a slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; CODEC_KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: CODEC_KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self { bytes })
    }

    /// Generates a random key.
    #[must_use]
    pub fn random() -> Self {
        let key = ChaCha20Poly1305::generate_key(&mut OsRng);
        Self { bytes: key.into() }
    }

    /// Returns the key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CODEC_KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for CodecKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Encrypts and decrypts config feed columns.
pub struct AtRestCodec {
    key: CodecKey,
}

impl AtRestCodec {
    /// Creates a codec from a key.
    #[must_use]
    pub fn new(key: CodecKey) -> Self {
        Self { key }
    }

    /// Encrypts a column value to `base64(nonce || ciphertext)`.
    pub fn conceal(&self, plaintext: &str) -> CryptoResult<String> {
        let cipher = ChaCha20Poly1305::new(self.key.as_bytes().into());
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::Conceal(e.to_string()))?;

        let mut bytes = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        bytes.extend_from_slice(&nonce);
        bytes.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(&bytes))
    }

    /// Decrypts a column value produced by `conceal`.
    pub fn reveal(&self, encoded: &str) -> CryptoResult<String> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::Reveal(format!("invalid base64: {e}")))?;

        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Reveal("data too short".to_string()));
        }

        let cipher = ChaCha20Poly1305::new(self.key.as_bytes().into());
        let nonce = Nonce::from_slice(&bytes[..NONCE_SIZE]);

        let plaintext = cipher
            .decrypt(nonce, &bytes[NONCE_SIZE..])
            .map_err(|_| {
                CryptoError::Reveal("decryption failed (wrong key or tampered data)".to_string())
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::Reveal(format!("invalid UTF-8: {e}")))
    }
}
