//! Property-based tests for the crypto layer.
//!
//! These verify the contracts the engine relies on:
//! - `access` exactly inverts `protect` for any input
//! - Substitution is deterministic and format-preserving
//! - Masking is deterministic and class-preserving
//! - The at-rest codec roundtrips and rejects wrong keys

use fieldveil_crypto::{
    AtRestCodec, CodecKey, ContextParams, CryptoProvider, HandleMaterial,
    ReferenceCryptoProvider, TransformHandle, CODEC_KEY_SIZE,
};
use proptest::prelude::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn text_strategy() -> impl Strategy<Value = String> {
    // ASCII plus some multi-byte characters to exercise pass-through.
    prop::string::string_regex("[a-zA-Z0-9 ._:#é@-]{0,200}").unwrap()
}

fn material_strategy() -> impl Strategy<Value = (String, String, String)> {
    (
        "[a-z0-9]{1,32}",
        "[a-z0-9]{1,32}",
        "[a-z0-9]{1,16}",
    )
}

fn key_strategy() -> impl Strategy<Value = CodecKey> {
    prop::array::uniform32(any::<u8>()).prop_map(CodecKey::from_bytes)
}

fn make_handle(secret: &str, identity: &str, format: &str) -> Box<dyn TransformHandle> {
    let provider = ReferenceCryptoProvider::new();
    let context = provider
        .new_context(&ContextParams {
            context_id: "ctx".into(),
            policy_ref: "pol".to_string(),
            trust_anchor: "tru".to_string(),
            client_identity: "cli".to_string(),
        })
        .unwrap();
    context
        .new_handle(&HandleMaterial::new(format, secret, identity))
        .unwrap()
        .checkout()
}

fn class(c: char) -> u8 {
    if c.is_ascii_digit() {
        1
    } else if c.is_ascii_uppercase() {
        2
    } else if c.is_ascii_lowercase() {
        3
    } else {
        0
    }
}

// =============================================================================
// SUBSTITUTION PROPERTIES
// =============================================================================

proptest! {
    /// Protect followed by access restores the input exactly.
    #[test]
    fn protect_access_roundtrip(
        text in text_strategy(),
        (secret, identity, format) in material_strategy(),
    ) {
        let mut h = make_handle(&secret, &identity, &format);
        let protected = h.protect(&text).unwrap();
        prop_assert_eq!(h.access(&protected).unwrap(), text);
    }

    /// Two handles from the same material produce identical ciphertext.
    #[test]
    fn protect_is_deterministic(
        text in text_strategy(),
        (secret, identity, format) in material_strategy(),
    ) {
        let mut a = make_handle(&secret, &identity, &format);
        let mut b = make_handle(&secret, &identity, &format);
        prop_assert_eq!(a.protect(&text).unwrap(), b.protect(&text).unwrap());
    }

    /// Every character keeps its class, and substitutable characters change.
    #[test]
    fn protect_preserves_format(
        text in text_strategy(),
        (secret, identity, format) in material_strategy(),
    ) {
        let mut h = make_handle(&secret, &identity, &format);
        let protected = h.protect(&text).unwrap();
        prop_assert_eq!(protected.chars().count(), text.chars().count());
        for (a, b) in text.chars().zip(protected.chars()) {
            prop_assert_eq!(class(a), class(b));
            if class(a) != 0 {
                prop_assert_ne!(a, b);
            } else {
                prop_assert_eq!(a, b);
            }
        }
    }

    /// Masking is deterministic and class-preserving.
    #[test]
    fn mask_is_deterministic_and_class_preserving(
        text in text_strategy(),
        (secret, identity, format) in material_strategy(),
    ) {
        let mut h = make_handle(&secret, &identity, &format);
        let protected = h.protect(&text).unwrap();
        let first = h.masked_access(&protected).unwrap();
        let second = h.masked_access(&protected).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.chars().count(), text.chars().count());
        for (a, b) in text.chars().zip(first.chars()) {
            prop_assert_eq!(class(a), class(b));
        }
    }
}

// =============================================================================
// AT-REST CODEC PROPERTIES
// =============================================================================

proptest! {
    /// Conceal followed by reveal restores the column value.
    #[test]
    fn codec_roundtrip(text in "\\PC{0,500}", key in key_strategy()) {
        let codec = AtRestCodec::new(key);
        let concealed = codec.conceal(&text).unwrap();
        prop_assert_eq!(codec.reveal(&concealed).unwrap(), text);
    }

    /// A different key never reveals the value.
    #[test]
    fn codec_rejects_wrong_key(
        text in "\\PC{0,100}",
        key in key_strategy(),
        other in key_strategy(),
    ) {
        prop_assume!(key.as_bytes() != other.as_bytes());
        let concealed = AtRestCodec::new(key).conceal(&text).unwrap();
        prop_assert!(AtRestCodec::new(other).reveal(&concealed).is_err());
    }
}

#[test]
fn codec_key_size_is_256_bits() {
    assert_eq!(CODEC_KEY_SIZE, 32);
}
