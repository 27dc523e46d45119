//! # Save Codec
//!
//! Encrypted, self-describing save-game serialization core.
//!
//! This crate turns arbitrary in-memory game-state values into an encrypted,
//! portable byte stream and back. Buffers are self-describing — they carry a
//! logical type identifier resolved against an explicit registry, so saves
//! survive type moves and rebuilds — and are encrypted with AES-128 in CBC
//! mode under a rotating store of keys and IVs.
//!
//! ## Components
//! - **[`core`]**: envelope framing and logical-name type resolution
//! - **[`crypto`]**: block cipher engine and the rotating [`KeyStore`]
//! - **[`codec`]**: the [`SaveCodec`] facade composing both
//! - **[`config`]**: format constants and TOML-loadable configuration
//!
//! ## Usage
//! ```
//! use save_codec::{KeyStore, SaveCodec, Savable, TypeRegistry};
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct PlayerState {
//!     hp: f32,
//!     items: Vec<String>,
//! }
//!
//! impl Savable for PlayerState {
//!     const TYPE_NAME: &'static str = "PlayerState";
//!     const MODULE: &'static str = "my-game";
//! }
//!
//! # fn main() -> save_codec::Result<()> {
//! let mut registry = TypeRegistry::new();
//! registry.register::<PlayerState>();
//! let codec = SaveCodec::new(registry, Arc::new(KeyStore::new()));
//!
//! let state = PlayerState { hp: 0.75, items: vec!["torch".into()] };
//! let artifact = codec.encode(&state)?;
//! let restored: PlayerState = codec.decode(&artifact)?;
//! assert_eq!(restored, state);
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//! - A decoded value is field-by-field equal to the encoded one, or the
//!   call fails; no partially valid results
//! - Wrong key/IV or tampered ciphertext surfaces as
//!   [`SaveError::PaddingValidation`], never as a wrong object
//! - The [`KeyStore`] always holds at least one key and one IV, and its
//!   cursors are always in range
//!
//! ## Limits
//! - Object graphs must be acyclic; shared and cyclic references are not
//!   supported (no back-reference table)
//! - Save artifacts carry no key/IV identifier: the caller must decode
//!   with the material that produced them

pub mod codec;
pub mod config;
pub mod core;
pub mod crypto;
pub mod error;
pub mod util;

pub use codec::SaveCodec;
pub use config::CodecConfig;
pub use core::envelope::{Envelope, Savable};
pub use core::registry::TypeRegistry;
pub use crypto::cipher::{ChainingMode, CipherConfig, Iv, Key, PaddingScheme};
pub use crypto::keystore::KeyStore;
pub use error::{Result, SaveError};
pub use util::compression::Compression;
