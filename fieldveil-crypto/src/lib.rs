//! Crypto layer for Fieldveil.
//!
//! Defines the capability seam the transform engine talks through
//! (`CryptoProvider` / `LibraryContext` / `TransformHandleFactory` /
//! `TransformHandle`), the published `HandleSet` registry snapshot with its
//! checkout guard, the at-rest codec protecting config feed columns, and a
//! deterministic reference provider for development and tests.

mod codec;
mod error;
mod provider;
mod reference;
mod registry;

pub use codec::{AtRestCodec, CodecKey, CODEC_KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use provider::{
    ContextParams, CryptoProvider, HandleMaterial, LibraryContext, TransformHandle,
    TransformHandleFactory,
};
pub use reference::ReferenceCryptoProvider;
pub use registry::{CheckedOutHandle, HandleEntry, HandleSet};
