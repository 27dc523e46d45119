//! Rotating registry of encryption keys and initialization vectors.
//!
//! The store holds two ordered lists (keys, IVs) and two cursors naming the
//! active material. Cursors are clamped into the valid range after every
//! mutation, and the lists can never be emptied, so `current_key` and
//! `current_iv` are always defined.
//!
//! This is the only shared mutable state in the subsystem. All access goes
//! through one `RwLock`; rotation is an administrative action, not a hot
//! path, so a single lock over the whole store is sufficient. Encode/decode
//! callers take one `(key, IV)` snapshot via [`KeyStore::current_material`]
//! and use it for the full call.

use crate::crypto::cipher::{Iv, Key, IV_LEN, KEY_LEN};
use crate::error::{Result, SaveError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Built-in default key, present in every store created by [`KeyStore::new`].
pub const DEFAULT_KEY_B64: &str = "A8EyAtQ0t22i4QoLD9yODw==";

/// Built-in default IV, present in every store created by [`KeyStore::new`].
pub const DEFAULT_IV_B64: &str = "1AECfwQFBhcICQ7LDAhODw==";

const DEFAULT_KEY: [u8; KEY_LEN] = [
    0x03, 0xC1, 0x32, 0x02, 0xD4, 0x34, 0xB7, 0x6D, 0xA2, 0xE1, 0x0A, 0x0B, 0x0F, 0xDC, 0x8E, 0x0F,
];

const DEFAULT_IV: [u8; IV_LEN] = [
    0xD4, 0x01, 0x02, 0x7F, 0x04, 0x05, 0x06, 0x17, 0x08, 0x09, 0x0E, 0xCB, 0x0C, 0x08, 0x4E, 0x0F,
];

struct Ring {
    keys: Vec<Key>,
    ivs: Vec<Iv>,
    key_index: usize,
    iv_index: usize,
}

impl Ring {
    fn clamp_cursors(&mut self) {
        self.key_index = self.key_index.min(self.keys.len() - 1);
        self.iv_index = self.iv_index.min(self.ivs.len() - 1);
    }
}

/// Ordered, mutable registry of keys and IVs with "current" cursors.
///
/// Instances are explicit values, not process-wide state: inject one (via
/// `Arc`) into a [`SaveCodec`](crate::SaveCodec) and tests can run with
/// isolated, reproducible material.
pub struct KeyStore {
    inner: RwLock<Ring>,
}

impl KeyStore {
    /// Create a store holding the built-in default key and IV.
    pub fn new() -> Self {
        Self::with_material(Key::from_bytes(DEFAULT_KEY), Iv::from_bytes(DEFAULT_IV))
    }

    /// Create a store seeded with the given key and IV as the active
    /// material.
    pub fn with_material(key: Key, iv: Iv) -> Self {
        Self {
            inner: RwLock::new(Ring {
                keys: vec![key],
                ivs: vec![iv],
                key_index: 0,
                iv_index: 0,
            }),
        }
    }

    // A poisoned lock only means a writer panicked; mutations hold the
    // write guard across non-panicking Vec operations, so the ring itself
    // is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Ring> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ring> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a key from its base64 text form.
    ///
    /// Returns `false` when the same material is already present (the store
    /// deduplicates by exact byte equality).
    ///
    /// # Errors
    /// Returns [`SaveError::InvalidKeyMaterial`] for undecodable or
    /// wrong-length material.
    pub fn add_key(&self, encryption_key: &str) -> Result<bool> {
        let key = Key::from_base64(encryption_key)?;
        let mut ring = self.write();
        if ring.keys.contains(&key) {
            return Ok(false);
        }
        ring.keys.push(key);
        debug!(keys = ring.keys.len(), "encryption key added");
        Ok(true)
    }

    /// Remove a key by its base64 text form.
    ///
    /// Returns `false` when the material is not present.
    ///
    /// # Errors
    /// Returns [`SaveError::LastKeyRemoval`] when removal would leave the
    /// store without any key; the store is left unchanged.
    pub fn remove_key(&self, encryption_key: &str) -> Result<bool> {
        let key = Key::from_base64(encryption_key)?;
        let mut ring = self.write();
        let Some(position) = ring.keys.iter().position(|k| *k == key) else {
            return Ok(false);
        };
        if ring.keys.len() == 1 {
            warn!("rejected removal of the last encryption key");
            return Err(SaveError::LastKeyRemoval);
        }
        ring.keys.remove(position);
        ring.clamp_cursors();
        info!(keys = ring.keys.len(), "encryption key removed");
        Ok(true)
    }

    /// Add an IV from its base64 text form. Same contract as
    /// [`KeyStore::add_key`].
    pub fn add_iv(&self, encryption_iv: &str) -> Result<bool> {
        let iv = Iv::from_base64(encryption_iv)?;
        let mut ring = self.write();
        if ring.ivs.contains(&iv) {
            return Ok(false);
        }
        ring.ivs.push(iv);
        debug!(ivs = ring.ivs.len(), "IV added");
        Ok(true)
    }

    /// Remove an IV by its base64 text form. Same contract as
    /// [`KeyStore::remove_key`], failing with [`SaveError::LastIvRemoval`].
    pub fn remove_iv(&self, encryption_iv: &str) -> Result<bool> {
        let iv = Iv::from_base64(encryption_iv)?;
        let mut ring = self.write();
        let Some(position) = ring.ivs.iter().position(|v| *v == iv) else {
            return Ok(false);
        };
        if ring.ivs.len() == 1 {
            warn!("rejected removal of the last IV");
            return Err(SaveError::LastIvRemoval);
        }
        ring.ivs.remove(position);
        ring.clamp_cursors();
        info!(ivs = ring.ivs.len(), "IV removed");
        Ok(true)
    }

    /// Index of the active key.
    pub fn key_index(&self) -> usize {
        self.read().key_index
    }

    /// Select the active key. Out-of-range requests are clamped silently to
    /// the nearest valid index; this is documented behavior, not an error.
    pub fn set_key_index(&self, index: isize) {
        let mut ring = self.write();
        let clamped = index.clamp(0, ring.keys.len() as isize - 1) as usize;
        ring.key_index = clamped;
        info!(key_index = clamped, "active key rotated");
    }

    /// Index of the active IV.
    pub fn iv_index(&self) -> usize {
        self.read().iv_index
    }

    /// Select the active IV. Clamped like [`KeyStore::set_key_index`].
    pub fn set_iv_index(&self, index: isize) {
        let mut ring = self.write();
        let clamped = index.clamp(0, ring.ivs.len() as isize - 1) as usize;
        ring.iv_index = clamped;
        info!(iv_index = clamped, "active IV rotated");
    }

    /// The active key.
    pub fn current_key(&self) -> Key {
        let ring = self.read();
        ring.keys[ring.key_index].clone()
    }

    /// The active IV, addressed by its own cursor.
    pub fn current_iv(&self) -> Iv {
        let ring = self.read();
        ring.ivs[ring.iv_index].clone()
    }

    /// A consistent `(key, IV)` snapshot taken under one lock acquisition.
    /// Encode/decode use this so mid-call rotation cannot split the pair.
    pub fn current_material(&self) -> (Key, Iv) {
        let ring = self.read();
        (ring.keys[ring.key_index].clone(), ring.ivs[ring.iv_index].clone())
    }

    /// Number of keys held.
    pub fn key_count(&self) -> usize {
        self.read().keys.len()
    }

    /// Number of IVs held.
    pub fn iv_count(&self) -> usize {
        self.read().ivs.len()
    }

    /// Generate fresh random key material in base64 text form, suitable for
    /// [`KeyStore::add_key`].
    pub fn generate_key() -> String {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill(&mut bytes[..]);
        STANDARD.encode(bytes)
    }

    /// Generate fresh random IV material in base64 text form, suitable for
    /// [`KeyStore::add_iv`].
    pub fn generate_iv() -> String {
        let mut bytes = [0u8; IV_LEN];
        rand::rng().fill(&mut bytes[..]);
        STANDARD.encode(bytes)
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}
