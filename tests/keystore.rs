//! KeyStore behavior through the public API: rotation, clamping, guards,
//! and concurrent use of a shared store.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use save_codec::{KeyStore, Savable, SaveCodec, SaveError, TypeRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Checkpoint {
    area: String,
    seconds_played: u64,
}

impl Savable for Checkpoint {
    const TYPE_NAME: &'static str = "Checkpoint";
    const MODULE: &'static str = "keystore-tests";
}

fn test_codec(store: Arc<KeyStore>) -> SaveCodec {
    let mut registry = TypeRegistry::new();
    registry.register::<Checkpoint>();
    SaveCodec::new(registry, store)
}

#[test]
fn add_key_dedup_through_facade() {
    let codec = test_codec(Arc::new(KeyStore::new()));
    let key = KeyStore::generate_key();

    assert!(codec.add_key(&key).expect("first add"));
    assert!(!codec.add_key(&key).expect("duplicate add"));
    assert_eq!(codec.keystore().key_count(), 2);
}

#[test]
fn index_clamping_through_facade() {
    let codec = test_codec(Arc::new(KeyStore::new()));
    codec.add_key(&KeyStore::generate_key()).expect("add");

    codec.set_key_index(-5);
    assert_eq!(codec.key_index(), 0);

    codec.set_key_index(100);
    assert_eq!(codec.key_index(), 1);

    codec.set_iv_index(3);
    assert_eq!(codec.iv_index(), 0);
}

#[test]
fn last_material_is_guarded() {
    let codec = test_codec(Arc::new(KeyStore::new()));

    let err = codec
        .remove_key(&codec.keystore().current_key().to_base64())
        .unwrap_err();
    assert!(matches!(err, SaveError::LastKeyRemoval));
    assert_eq!(codec.keystore().key_count(), 1);

    let err = codec
        .remove_iv(&codec.keystore().current_iv().to_base64())
        .unwrap_err();
    assert!(matches!(err, SaveError::LastIvRemoval));
    assert_eq!(codec.keystore().iv_count(), 1);
}

#[test]
fn removal_shifts_but_never_strands_the_cursor() {
    let store = Arc::new(KeyStore::new());
    let second = KeyStore::generate_key();
    let third = KeyStore::generate_key();
    store.add_key(&second).expect("add");
    store.add_key(&third).expect("add");

    store.set_key_index(2);
    assert!(store.remove_key(&third).expect("remove"));
    assert_eq!(store.key_index(), 1);
    assert_eq!(store.current_key().to_base64(), second);
}

#[test]
fn rotation_workflow() {
    let store = Arc::new(KeyStore::new());
    let codec = test_codec(Arc::clone(&store));
    let checkpoint = Checkpoint { area: "sunken vault".into(), seconds_played: 4321 };

    // Save under the built-in material.
    let old_artifact = codec.encode(&checkpoint).expect("encode");

    // Administrative rotation to fresh material.
    store.add_key(&KeyStore::generate_key()).expect("add key");
    store.add_iv(&KeyStore::generate_iv()).expect("add IV");
    store.set_key_index(1);
    store.set_iv_index(1);

    // New saves use the new material and round-trip.
    let new_artifact = codec.encode(&checkpoint).expect("encode");
    let restored: Checkpoint = codec.decode(&new_artifact).expect("decode");
    assert_eq!(restored, checkpoint);

    // The old artifact needs the old material back.
    assert!(codec.decode::<Checkpoint>(&old_artifact).is_err());
    store.set_key_index(0);
    store.set_iv_index(0);
    let restored: Checkpoint = codec.decode(&old_artifact).expect("decode");
    assert_eq!(restored, checkpoint);
}

#[test]
fn concurrent_encode_decode_with_rotation() {
    let store = Arc::new(KeyStore::new());
    store.add_key(&KeyStore::generate_key()).expect("add key");

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let codec = test_codec(store);
                let checkpoint = Checkpoint {
                    area: format!("zone {worker}"),
                    seconds_played: worker,
                };
                for _ in 0..200 {
                    let artifact = codec.encode(&checkpoint).expect("encode");
                    // A rotation may land between this encode and decode;
                    // the decode must then fail cleanly, never return a
                    // different checkpoint.
                    match codec.decode::<Checkpoint>(&artifact) {
                        Ok(restored) => assert_eq!(restored, checkpoint),
                        Err(
                            SaveError::PaddingValidation
                            | SaveError::MalformedBuffer(_)
                            | SaveError::TypeResolution(_),
                        ) => {}
                        Err(other) => panic!("unexpected decode error: {other}"),
                    }
                }
            })
        })
        .collect();

    // Rotate the shared store while the workers hammer it.
    for i in 0..100 {
        store.set_key_index(i % 2);
    }

    for worker in workers {
        worker.join().expect("worker panicked");
    }

    // Cursors are still in range afterwards.
    assert!(store.key_index() < store.key_count());
    assert!(store.iv_index() < store.iv_count());
}
