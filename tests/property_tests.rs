//! Property-based tests using proptest
//!
//! These tests validate codec invariants across a wide range of randomly
//! generated inputs: round-trips, cursor clamping, and strict rejection of
//! malformed buffers.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use save_codec::crypto::cipher::{self, CipherConfig, Iv, Key};
use save_codec::{KeyStore, Savable, SaveCodec, TypeRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SaveSlot {
    name: String,
    seed: u64,
    completion: u32,
    unlocked: Vec<u16>,
}

impl Savable for SaveSlot {
    const TYPE_NAME: &'static str = "SaveSlot";
    const MODULE: &'static str = "property-tests";
}

fn slot_strategy() -> impl Strategy<Value = SaveSlot> {
    (
        ".{0,64}",
        any::<u64>(),
        any::<u32>(),
        prop::collection::vec(any::<u16>(), 0..128),
    )
        .prop_map(|(name, seed, completion, unlocked)| SaveSlot {
            name,
            seed,
            completion,
            unlocked,
        })
}

fn test_codec() -> SaveCodec {
    let mut registry = TypeRegistry::new();
    registry.register::<SaveSlot>();
    SaveCodec::new(registry, Arc::new(KeyStore::new()))
}

// Property: every acyclic savable value survives encode/decode unchanged
proptest! {
    #[test]
    fn prop_codec_roundtrip(slot in slot_strategy()) {
        let codec = test_codec();
        let artifact = codec.encode(&slot).expect("encode");
        let restored: SaveSlot = codec.decode(&artifact).expect("decode");
        prop_assert_eq!(restored, slot);
    }
}

// Property: every byte buffer survives encrypt/decrypt under any material
proptest! {
    #[test]
    fn prop_cipher_roundtrip(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        key_bytes in any::<[u8; 16]>(),
        iv_bytes in any::<[u8; 16]>(),
    ) {
        let key = Key::from_bytes(key_bytes);
        let iv = Iv::from_bytes(iv_bytes);
        let ciphertext = cipher::encrypt(&data, &key, &iv, CipherConfig::default())
            .expect("encrypt");
        prop_assert_eq!(ciphertext.len() % 16, 0);
        let plaintext = cipher::decrypt(&ciphertext, &key, &iv, CipherConfig::default())
            .expect("decrypt");
        prop_assert_eq!(plaintext, data);
    }
}

// Property: string path round-trips arbitrary unicode
proptest! {
    #[test]
    fn prop_string_roundtrip(text in "\\PC{0,256}") {
        let codec = test_codec();
        let encoded = codec.encode_string(&text).expect("encode");
        let decoded = codec.decode_string(&encoded).expect("decode");
        prop_assert_eq!(decoded, text);
    }
}

// Property: cursor setters never leave the valid range
proptest! {
    #[test]
    fn prop_index_always_clamped(requested in any::<isize>(), extra_keys in 0usize..8) {
        let store = KeyStore::new();
        for _ in 0..extra_keys {
            store.add_key(&KeyStore::generate_key()).expect("add");
        }
        store.set_key_index(requested);
        prop_assert!(store.key_index() < store.key_count());
    }
}

// Property: random byte soup never decodes into a value
proptest! {
    #[test]
    fn prop_garbage_never_decodes(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let codec = test_codec();
        prop_assert!(codec.decode::<SaveSlot>(&data).is_err());
    }
}

// Property: artifacts are deterministic for fixed material
proptest! {
    #[test]
    fn prop_encoding_deterministic(slot in slot_strategy()) {
        let codec = test_codec();
        let first = codec.encode(&slot).expect("encode");
        let second = codec.encode(&slot).expect("encode");
        prop_assert_eq!(first, second);
    }
}
