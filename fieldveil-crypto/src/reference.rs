//! Reference crypto provider.
//!
//! Deterministic, invertible, format-preserving keyed substitution over the
//! three ASCII character classes (digits, uppercase, lowercase); every other
//! character passes through unchanged. Not a real FPE cipher; it exists so
//! the engine, the tests and development setups have a provider with the
//! contract the engine relies on: same material always yields the same
//! ciphertext, `access` exactly inverts `protect`, and every substituted
//! character differs from its input.

use crate::error::CryptoResult;
use crate::provider::{
    ContextParams, CryptoProvider, HandleMaterial, LibraryContext, TransformHandle,
    TransformHandleFactory,
};
use fieldveil_types::ContextId;
use sha2::{Digest, Sha256};
use std::sync::Arc;

const KEYSTREAM_DOMAIN: &[u8] = b"fieldveil.reference.v1";

/// Reference provider: contexts carry no native state, handles substitute
/// per character class with a SHA-256 keystream.
#[derive(Debug, Default)]
pub struct ReferenceCryptoProvider;

impl ReferenceCryptoProvider {
    /// Creates the provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for ReferenceCryptoProvider {
    fn new_context(&self, params: &ContextParams) -> CryptoResult<Arc<dyn LibraryContext>> {
        Ok(Arc::new(ReferenceContext {
            context_id: params.context_id.clone(),
        }))
    }
}

struct ReferenceContext {
    context_id: ContextId,
}

impl LibraryContext for ReferenceContext {
    fn context_id(&self) -> &ContextId {
        &self.context_id
    }

    fn new_handle(
        &self,
        material: &HandleMaterial,
    ) -> CryptoResult<Arc<dyn TransformHandleFactory>> {
        Ok(Arc::new(ReferenceHandleFactory {
            master: derive_master(material),
        }))
    }
}

/// Derives the 32-byte keystream master from (secret, identity, format),
/// length-prefixed so distinct tuples never collide.
fn derive_master(material: &HandleMaterial) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(KEYSTREAM_DOMAIN);
    for part in [
        &material.shared_secret,
        &material.identity,
        &material.format,
    ] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.finalize().into()
}

struct ReferenceHandleFactory {
    master: [u8; 32],
}

impl TransformHandleFactory for ReferenceHandleFactory {
    fn checkout(&self) -> Box<dyn TransformHandle> {
        Box::new(ReferenceHandle {
            master: self.master,
            cached_block: None,
        })
    }
}

/// Character class of a substitutable character: (class base, class size).
fn class_of(c: char) -> Option<(u8, u8)> {
    if c.is_ascii_digit() {
        Some((b'0', 10))
    } else if c.is_ascii_uppercase() {
        Some((b'A', 26))
    } else if c.is_ascii_lowercase() {
        Some((b'a', 26))
    } else {
        None
    }
}

struct ReferenceHandle {
    master: [u8; 32],
    /// Last keystream block, cached because adjacent characters almost
    /// always read from the same block.
    cached_block: Option<(u64, [u8; 32])>,
}

impl ReferenceHandle {
    fn keystream_byte(&mut self, index: usize) -> u8 {
        let block_index = (index / 32) as u64;
        let offset = index % 32;

        match self.cached_block {
            Some((cached, block)) if cached == block_index => block[offset],
            _ => {
                let mut hasher = Sha256::new();
                hasher.update(self.master);
                hasher.update(block_index.to_le_bytes());
                let block: [u8; 32] = hasher.finalize().into();
                self.cached_block = Some((block_index, block));
                block[offset]
            }
        }
    }

    /// Shift for the substitutable character at `index`, always in
    /// `1..class_size` so a substituted character never equals its input.
    fn shift_at(&mut self, index: usize, class_size: u8) -> u8 {
        (self.keystream_byte(index) % (class_size - 1)) + 1
    }

    fn substitute(&mut self, text: &str, forward: bool) -> String {
        let mut out = String::with_capacity(text.len());
        let mut index = 0usize;
        for c in text.chars() {
            match class_of(c) {
                Some((base, size)) => {
                    let shift = self.shift_at(index, size);
                    let pos = (c as u8) - base;
                    let shifted = if forward {
                        (pos + shift) % size
                    } else {
                        (pos + size - shift) % size
                    };
                    out.push((base + shifted) as char);
                    index += 1;
                }
                None => out.push(c),
            }
        }
        out
    }
}

impl TransformHandle for ReferenceHandle {
    fn protect(&mut self, text: &str) -> CryptoResult<String> {
        Ok(self.substitute(text, true))
    }

    fn access(&mut self, text: &str) -> CryptoResult<String> {
        Ok(self.substitute(text, false))
    }

    fn masked_access(&mut self, text: &str) -> CryptoResult<String> {
        let revealed = self.access(text)?;
        Ok(mask(&revealed))
    }
}

/// Class-preserving redaction: digits become `9`, uppercase `X`, lowercase
/// `x`, everything else is kept. Values with more than four substitutable
/// characters keep their last four in the clear.
fn mask(text: &str) -> String {
    let transformable = text.chars().filter(|c| class_of(*c).is_some()).count();
    let reveal_from = if transformable > 4 {
        transformable - 4
    } else {
        transformable
    };

    let mut out = String::with_capacity(text.len());
    let mut index = 0usize;
    for c in text.chars() {
        match class_of(c) {
            Some((base, _)) if index < reveal_from => {
                out.push(match base {
                    b'0' => '9',
                    b'A' => 'X',
                    _ => 'x',
                });
                index += 1;
            }
            Some(_) => {
                out.push(c);
                index += 1;
            }
            None => out.push(c),
        }
    }
    out
}
