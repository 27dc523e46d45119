//! The public encode/decode facade.
//!
//! [`SaveCodec`] composes the type registry, the key store, and the cipher
//! engine into the four operations callers actually use: `encode`/`decode`
//! for savable values and `encode_string`/`decode_string` for plain text.
//! Encoding serializes into a framed envelope, then encrypts under the
//! store's current key and IV; decoding reverses the composition. The codec
//! itself holds no mutable state and never mutates the store — key and IV
//! management is delegated verbatim.
//!
//! A save artifact is exactly the byte output of [`SaveCodec::encode`]; it
//! carries no header naming the key/IV that produced it. Rotating the
//! current material without retaining the old entries therefore invalidates
//! previously written artifacts — decoding them fails with
//! [`SaveError::PaddingValidation`](crate::SaveError::PaddingValidation)
//! rather than producing a wrong value.

use crate::core::envelope::{self, Envelope, Savable};
use crate::core::registry::TypeRegistry;
use crate::crypto::cipher::{self, CipherConfig};
use crate::crypto::keystore::KeyStore;
use crate::error::{Result, SaveError};
use crate::util::compression::Compression;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Encode/decode facade over the graph serializer and cipher engine.
///
/// Construction wires in the collaborators explicitly; there is no global
/// instance. Encode/decode may run concurrently from any number of threads.
pub struct SaveCodec {
    registry: TypeRegistry,
    keys: Arc<KeyStore>,
    compression: Compression,
}

impl SaveCodec {
    /// Create a codec over a populated registry and key store.
    pub fn new(registry: TypeRegistry, keys: Arc<KeyStore>) -> Self {
        Self {
            registry,
            keys,
            compression: Compression::None,
        }
    }

    /// Request compression of serialized bodies above the size threshold.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// The key store backing this codec.
    pub fn keystore(&self) -> &KeyStore {
        &self.keys
    }

    /// The type registry backing this codec.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Serialize and encrypt a savable value with the default CBC/PKCS#7
    /// configuration.
    pub fn encode<T: Savable>(&self, value: &T) -> Result<Vec<u8>> {
        self.encode_with(value, CipherConfig::default())
    }

    /// Serialize and encrypt a savable value with an explicit cipher
    /// configuration.
    pub fn encode_with<T: Savable>(&self, value: &T, config: CipherConfig) -> Result<Vec<u8>> {
        let envelope = Envelope::wrap(value)?;
        let plain = envelope::seal(&envelope, self.compression)?;
        let (key, iv) = self.keys.current_material();
        let ciphertext = cipher::encrypt(&plain, &key, &iv, config)?;
        debug!(
            type_name = T::TYPE_NAME,
            plain_len = plain.len(),
            cipher_len = ciphertext.len(),
            "encoded save value"
        );
        Ok(ciphertext)
    }

    /// Decrypt and deserialize a buffer produced by [`SaveCodec::encode`],
    /// with the default configuration.
    pub fn decode<T: Savable>(&self, bytes: &[u8]) -> Result<T> {
        self.decode_with(bytes, CipherConfig::default())
    }

    /// Decrypt and deserialize with an explicit cipher configuration.
    ///
    /// The buffer's embedded type identifier is resolved against the live
    /// registry; the decoded value must be of type `T`.
    pub fn decode_with<T: Savable>(&self, bytes: &[u8], config: CipherConfig) -> Result<T> {
        let (envelope, boxed) = self.decode_envelope(bytes, config)?;
        boxed.downcast::<T>().map(|value| *value).map_err(|_| {
            SaveError::TypeResolution(format!(
                "buffer holds '{}', not '{}'",
                envelope.type_name,
                T::TYPE_NAME
            ))
        })
    }

    /// Decrypt and deserialize without naming the concrete type up front.
    ///
    /// Returns the reconstructed value as `Box<dyn Any>`; downcast to the
    /// type matching the buffer's identifier.
    pub fn decode_any(&self, bytes: &[u8]) -> Result<Box<dyn Any + Send + Sync>> {
        self.decode_any_with(bytes, CipherConfig::default())
    }

    /// [`SaveCodec::decode_any`] with an explicit cipher configuration.
    pub fn decode_any_with(
        &self,
        bytes: &[u8],
        config: CipherConfig,
    ) -> Result<Box<dyn Any + Send + Sync>> {
        let (_, boxed) = self.decode_envelope(bytes, config)?;
        Ok(boxed)
    }

    fn decode_envelope(
        &self,
        bytes: &[u8],
        config: CipherConfig,
    ) -> Result<(Envelope, Box<dyn Any + Send + Sync>)> {
        let (key, iv) = self.keys.current_material();
        let plain = cipher::decrypt(bytes, &key, &iv, config)?;
        let envelope = envelope::open(&plain)?;
        let entry = self.registry.resolve(&envelope.type_name, &envelope.module)?;
        let boxed = entry.decode_payload(&envelope.payload)?;
        debug!(
            type_name = %envelope.type_name,
            cipher_len = bytes.len(),
            "decoded save value"
        );
        Ok((envelope, boxed))
    }

    /// Encrypt UTF-8 text directly (no envelope) and return the ciphertext
    /// as base64 for safe text transport.
    pub fn encode_string(&self, text: &str) -> Result<String> {
        self.encode_string_with(text, CipherConfig::default())
    }

    /// [`SaveCodec::encode_string`] with an explicit cipher configuration.
    pub fn encode_string_with(&self, text: &str, config: CipherConfig) -> Result<String> {
        let (key, iv) = self.keys.current_material();
        let ciphertext = cipher::encrypt(text.as_bytes(), &key, &iv, config)?;
        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypt base64 text produced by [`SaveCodec::encode_string`].
    pub fn decode_string(&self, text: &str) -> Result<String> {
        self.decode_string_with(text, CipherConfig::default())
    }

    /// [`SaveCodec::decode_string`] with an explicit cipher configuration.
    pub fn decode_string_with(&self, text: &str, config: CipherConfig) -> Result<String> {
        let ciphertext = STANDARD
            .decode(text)
            .map_err(|e| SaveError::MalformedBuffer(format!("invalid base64: {e}")))?;
        let (key, iv) = self.keys.current_material();
        let plain = cipher::decrypt(&ciphertext, &key, &iv, config)?;
        String::from_utf8(plain)
            .map_err(|_| SaveError::MalformedBuffer("decrypted text is not valid UTF-8".into()))
    }

    /// Add a key to the store. See [`KeyStore::add_key`].
    pub fn add_key(&self, encryption_key: &str) -> Result<bool> {
        self.keys.add_key(encryption_key)
    }

    /// Remove a key from the store. See [`KeyStore::remove_key`].
    pub fn remove_key(&self, encryption_key: &str) -> Result<bool> {
        self.keys.remove_key(encryption_key)
    }

    /// Add an IV to the store. See [`KeyStore::add_iv`].
    pub fn add_iv(&self, encryption_iv: &str) -> Result<bool> {
        self.keys.add_iv(encryption_iv)
    }

    /// Remove an IV from the store. See [`KeyStore::remove_iv`].
    pub fn remove_iv(&self, encryption_iv: &str) -> Result<bool> {
        self.keys.remove_iv(encryption_iv)
    }

    /// Index of the active key.
    pub fn key_index(&self) -> usize {
        self.keys.key_index()
    }

    /// Select the active key (clamped).
    pub fn set_key_index(&self, index: isize) {
        self.keys.set_key_index(index);
    }

    /// Index of the active IV.
    pub fn iv_index(&self) -> usize {
        self.keys.iv_index()
    }

    /// Select the active IV (clamped).
    pub fn set_iv_index(&self, index: isize) {
        self.keys.set_iv_index(index);
    }
}
