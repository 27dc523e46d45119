//! # Configuration Management
//!
//! Format constants and codec configuration.
//!
//! This module holds the buffer-format constants shared across the crate
//! and a structured configuration for wiring a codec from a file, so a game
//! can ship key rotation material and cipher settings next to its other
//! assets instead of hardcoding them.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - TOML strings via `from_toml()`
//! - Direct instantiation with defaults
//!
//! ## Security Considerations
//! - Key material in configuration files must be protected by file
//!   permissions; this crate does not manage secret distribution
//! - The default material exists so saves work out of the box; shipping
//!   titles should rotate to their own keys

use crate::crypto::cipher::{ChainingMode, CipherConfig, Iv, Key, PaddingScheme};
use crate::crypto::keystore::{KeyStore, DEFAULT_IV_B64, DEFAULT_KEY_B64};
use crate::error::{Result, SaveError};
use crate::util::compression::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Current supported buffer format version
pub const FORMAT_VERSION: u8 = 1;

/// Magic bytes identifying a save buffer (0x47534156 → "GSAV")
pub const SAVE_MAGIC: [u8; 4] = [0x47, 0x53, 0x41, 0x56];

/// Max allowed save buffer size (16 MB)
pub const MAX_SAVE_SIZE: usize = 16 * 1024 * 1024;

/// Serialized bodies below this size are never compressed
pub const COMPRESSION_THRESHOLD: usize = 512;

/// Codec configuration: key material, cursors, and cipher settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecConfig {
    /// Base64 encryption keys, in rotation order.
    #[serde(default = "default_keys")]
    pub keys: Vec<String>,

    /// Base64 initialization vectors, in rotation order.
    #[serde(default = "default_ivs")]
    pub ivs: Vec<String>,

    /// Index of the active key.
    #[serde(default)]
    pub key_index: usize,

    /// Index of the active IV.
    #[serde(default)]
    pub iv_index: usize,

    /// Block chaining mode.
    #[serde(default)]
    pub mode: ChainingMode,

    /// Padding scheme.
    #[serde(default)]
    pub padding: PaddingScheme,

    /// Compression of serialized bodies.
    #[serde(default)]
    pub compression: Compression,
}

fn default_keys() -> Vec<String> {
    vec![DEFAULT_KEY_B64.to_string()]
}

fn default_ivs() -> Vec<String> {
    vec![DEFAULT_IV_B64.to_string()]
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            keys: default_keys(),
            ivs: default_ivs(),
            key_index: 0,
            iv_index: 0,
            mode: ChainingMode::default(),
            padding: PaddingScheme::default(),
            compression: Compression::default(),
        }
    }
}

impl CodecConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| SaveError::Config(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| SaveError::Config(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SaveError::Config(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(SaveError::Config("at least one key is required".into()));
        }
        if self.ivs.is_empty() {
            return Err(SaveError::Config("at least one IV is required".into()));
        }
        Ok(())
    }

    /// Build a [`KeyStore`] holding this configuration's material, with the
    /// configured cursors applied (clamped like the setters).
    ///
    /// # Errors
    /// Returns [`SaveError::InvalidKeyMaterial`] if any entry is not valid
    /// 16-byte base64 material.
    pub fn build_keystore(&self) -> Result<KeyStore> {
        self.validate()?;

        let first_key = Key::from_base64(&self.keys[0])?;
        let first_iv = Iv::from_base64(&self.ivs[0])?;
        let store = KeyStore::with_material(first_key, first_iv);
        for key in &self.keys[1..] {
            store.add_key(key)?;
        }
        for iv in &self.ivs[1..] {
            store.add_iv(iv)?;
        }
        store.set_key_index(self.key_index as isize);
        store.set_iv_index(self.iv_index as isize);
        Ok(store)
    }

    /// The per-call cipher configuration this document selects.
    pub fn cipher(&self) -> CipherConfig {
        CipherConfig {
            mode: self.mode,
            padding: self.padding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_hold_builtin_material() {
        let config = CodecConfig::default();
        assert_eq!(config.keys, vec![DEFAULT_KEY_B64.to_string()]);
        assert_eq!(config.ivs, vec![DEFAULT_IV_B64.to_string()]);
        assert_eq!(config.mode, ChainingMode::Cbc);
        assert_eq!(config.padding, PaddingScheme::Pkcs7);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn minimal_toml_uses_defaults() {
        let config = CodecConfig::from_toml("").unwrap();
        let store = config.build_keystore().unwrap();
        assert_eq!(store.current_key().to_base64(), DEFAULT_KEY_B64);
        assert_eq!(store.current_iv().to_base64(), DEFAULT_IV_B64);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn full_document_round_trips() {
        let second_key = KeyStore::generate_key();
        let document = format!(
            r#"
keys = ["{DEFAULT_KEY_B64}", "{second_key}"]
ivs = ["{DEFAULT_IV_B64}"]
key_index = 1
mode = "cbc"
padding = "ansix923"
compression = "lz4"
"#
        );
        let config = CodecConfig::from_toml(&document).unwrap();
        assert_eq!(config.padding, PaddingScheme::AnsiX923);
        assert_eq!(config.compression, Compression::Lz4);

        let store = config.build_keystore().unwrap();
        assert_eq!(store.key_count(), 2);
        assert_eq!(store.key_index(), 1);
        assert_eq!(store.current_key().to_base64(), second_key);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn out_of_range_cursor_is_clamped() {
        let config = CodecConfig {
            key_index: 99,
            ..Default::default()
        };
        let store = config.build_keystore().unwrap();
        assert_eq!(store.key_index(), 0);
    }

    #[test]
    fn empty_key_list_rejected() {
        assert!(matches!(
            CodecConfig::from_toml("keys = []"),
            Err(SaveError::Config(_))
        ));
    }

    #[test]
    fn bad_material_rejected() {
        let config = CodecConfig {
            keys: vec!["not base64 !!!".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.build_keystore(),
            Err(SaveError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn invalid_toml_rejected() {
        assert!(matches!(
            CodecConfig::from_toml("keys = 5"),
            Err(SaveError::Config(_))
        ));
    }
}
