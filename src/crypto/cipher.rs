//! AES-128 block cipher with per-call chaining and padding configuration.
//!
//! Save artifacts are encrypted with AES in cipher-block-chaining mode by
//! default: each plaintext block is XORed with the previous ciphertext block
//! before encryption, with the IV standing in for the first. ECB is kept for
//! parity with legacy artifacts. Padding is byte-oriented (PKCS#7 default)
//! and strictly validated on decrypt, so a wrong key/IV or a corrupted
//! ciphertext surfaces as [`SaveError::PaddingValidation`] instead of
//! silently producing garbage.
//!
//! Both directions are pure transforms: no state is held between calls, and
//! the engine is thread-safe by construction.

use crate::error::{Result, SaveError};
use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Byte length of an encryption key (16 bytes = AES-128).
pub const KEY_LEN: usize = 16;

/// Byte length of an initialization vector (one cipher block).
pub const IV_LEN: usize = 16;

/// Cipher block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Opaque encryption key material. Zeroized on drop; the `Debug`
/// representation never prints the bytes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_LEN]);

/// Opaque initialization vector material. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Iv([u8; IV_LEN]);

impl Key {
    /// Construct a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a key from its external base64 text form.
    ///
    /// # Errors
    /// Returns [`SaveError::InvalidKeyMaterial`] if the text is not valid
    /// base64 or does not decode to exactly [`KEY_LEN`] bytes.
    pub fn from_base64(text: &str) -> Result<Self> {
        let mut raw = decode_material(text, KEY_LEN, "key")?;
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&raw);
        raw.zeroize();
        Ok(Self(bytes))
    }

    /// External base64 text form of this key.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Iv {
    /// Construct an IV from raw bytes.
    pub fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse an IV from its external base64 text form.
    ///
    /// # Errors
    /// Returns [`SaveError::InvalidKeyMaterial`] if the text is not valid
    /// base64 or does not decode to exactly [`IV_LEN`] bytes.
    pub fn from_base64(text: &str) -> Result<Self> {
        let mut raw = decode_material(text, IV_LEN, "IV")?;
        let mut bytes = [0u8; IV_LEN];
        bytes.copy_from_slice(&raw);
        raw.zeroize();
        Ok(Self(bytes))
    }

    /// External base64 text form of this IV.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Raw IV bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

impl fmt::Debug for Iv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Iv(..)")
    }
}

fn decode_material(text: &str, expected: usize, what: &str) -> Result<Vec<u8>> {
    let raw = STANDARD
        .decode(text)
        .map_err(|e| SaveError::InvalidKeyMaterial(format!("{what} is not valid base64: {e}")))?;
    if raw.len() != expected {
        return Err(SaveError::InvalidKeyMaterial(format!(
            "{what} must be {expected} bytes, got {}",
            raw.len()
        )));
    }
    Ok(raw)
}

/// Block chaining mode applied across cipher blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainingMode {
    /// Cipher-block-chaining: each plaintext block is XORed with the
    /// previous ciphertext block before encryption (default).
    #[default]
    Cbc,
    /// Electronic codebook: blocks are encrypted independently. Kept only
    /// for decoding legacy artifacts; do not use for new saves.
    Ecb,
}

/// Byte-oriented padding scheme rounding plaintext up to a block multiple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingScheme {
    /// PKCS#7: every pad byte holds the total pad length (default).
    #[default]
    Pkcs7,
    /// ANSI X9.23: zero fill with the pad length in the final byte.
    AnsiX923,
}

/// The (chaining mode, padding scheme) pair selected per call.
///
/// Never persisted; supplied fresh on every encrypt/decrypt call and
/// defaulting to CBC with PKCS#7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct CipherConfig {
    /// Block chaining mode.
    #[serde(default)]
    pub mode: ChainingMode,
    /// Padding scheme.
    #[serde(default)]
    pub padding: PaddingScheme,
}

/// Encrypt a plaintext buffer under the given key and IV.
///
/// The plaintext is padded to a whole number of blocks (a full padding block
/// is appended when the length is already a multiple), then each block is
/// encrypted under the configured chaining mode.
///
/// # Errors
/// Returns [`SaveError::InvalidKeyMaterial`] if key or IV length does not
/// match the cipher's requirements.
pub fn encrypt(plaintext: &[u8], key: &Key, iv: &Iv, config: CipherConfig) -> Result<Vec<u8>> {
    let cipher = build_cipher(key)?;

    let mut buf = plaintext.to_vec();
    apply_padding(&mut buf, config.padding);

    match config.mode {
        ChainingMode::Cbc => {
            let mut prev = [0u8; BLOCK_LEN];
            prev.copy_from_slice(iv.as_bytes());
            for chunk in buf.chunks_exact_mut(BLOCK_LEN) {
                for (byte, mask) in chunk.iter_mut().zip(prev.iter()) {
                    *byte ^= mask;
                }
                cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
                prev.copy_from_slice(chunk);
            }
        }
        ChainingMode::Ecb => {
            for chunk in buf.chunks_exact_mut(BLOCK_LEN) {
                cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
            }
        }
    }

    Ok(buf)
}

/// Decrypt a ciphertext buffer under the given key and IV.
///
/// Reverses the chaining mode per block, then validates and strips the
/// padding recovered from the final block.
///
/// # Errors
/// Returns [`SaveError::InvalidKeyMaterial`] if key or IV length does not
/// match the cipher's requirements, and [`SaveError::PaddingValidation`]
/// when the ciphertext is not a positive multiple of the block size or the
/// recovered padding is inconsistent — both indicate a wrong key/IV/mode or
/// a corrupted artifact.
pub fn decrypt(ciphertext: &[u8], key: &Key, iv: &Iv, config: CipherConfig) -> Result<Vec<u8>> {
    let cipher = build_cipher(key)?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(SaveError::PaddingValidation);
    }

    let mut buf = ciphertext.to_vec();

    match config.mode {
        ChainingMode::Cbc => {
            let mut prev = [0u8; BLOCK_LEN];
            prev.copy_from_slice(iv.as_bytes());
            for chunk in buf.chunks_exact_mut(BLOCK_LEN) {
                let mut saved = [0u8; BLOCK_LEN];
                saved.copy_from_slice(chunk);
                cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
                for (byte, mask) in chunk.iter_mut().zip(prev.iter()) {
                    *byte ^= mask;
                }
                prev = saved;
            }
        }
        ChainingMode::Ecb => {
            for chunk in buf.chunks_exact_mut(BLOCK_LEN) {
                cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
            }
        }
    }

    strip_padding(&mut buf, config.padding)?;
    Ok(buf)
}

fn build_cipher(key: &Key) -> Result<Aes128> {
    Aes128::new_from_slice(key.as_bytes())
        .map_err(|_| SaveError::InvalidKeyMaterial(format!("key must be {KEY_LEN} bytes")))
}

fn apply_padding(buf: &mut Vec<u8>, scheme: PaddingScheme) {
    // Always pads: 1..=BLOCK_LEN bytes, a full block when already aligned.
    let pad = BLOCK_LEN - buf.len() % BLOCK_LEN;
    match scheme {
        PaddingScheme::Pkcs7 => {
            buf.extend(std::iter::repeat(pad as u8).take(pad));
        }
        PaddingScheme::AnsiX923 => {
            buf.extend(std::iter::repeat(0u8).take(pad - 1));
            buf.push(pad as u8);
        }
    }
}

fn strip_padding(buf: &mut Vec<u8>, scheme: PaddingScheme) -> Result<()> {
    let pad = *buf.last().ok_or(SaveError::PaddingValidation)? as usize;
    if pad == 0 || pad > BLOCK_LEN || pad > buf.len() {
        return Err(SaveError::PaddingValidation);
    }

    let tail = &buf[buf.len() - pad..];
    let consistent = match scheme {
        PaddingScheme::Pkcs7 => tail.iter().all(|&b| b as usize == pad),
        PaddingScheme::AnsiX923 => tail[..pad - 1].iter().all(|&b| b == 0),
    };
    if !consistent {
        return Err(SaveError::PaddingValidation);
    }

    buf.truncate(buf.len() - pad);
    Ok(())
}
