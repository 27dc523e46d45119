//! # Error Types
//!
//! Comprehensive error handling for the save codec.
//!
//! This module defines all error variants that can occur while encoding or
//! decoding save artifacts, from structural buffer failures to cryptographic
//! validation and keyring management.
//!
//! ## Error Categories
//! - **Buffer Errors**: truncated, corrupted, or foreign byte sequences
//! - **Resolution Errors**: serialized type identifiers with no live mapping
//! - **Cryptographic Errors**: invalid key material, padding validation
//! - **Keyring Errors**: removals that would leave the store unusable
//! - **Configuration Errors**: unreadable or invalid codec configuration
//!
//! All errors implement `std::error::Error` for interoperability.
//!
//! ## Propagation Policy
//! Every failure is surfaced directly to the caller. Nothing is caught and
//! logged internally, and nothing is retried: a swallowed cryptographic or
//! structural failure would hand back a corrupted value instead of an error,
//! which is unacceptable for save-game integrity. The caller decides whether
//! a decode failure means "no existing save" or "report corruption".

use thiserror::Error;

/// SaveError is the primary error type for all codec operations.
#[derive(Error, Debug)]
pub enum SaveError {
    /// The byte sequence is not a well-formed serialized buffer: truncated,
    /// wrong magic, unknown format version or flags, or an envelope that
    /// does not decode.
    #[error("malformed save buffer: {0}")]
    MalformedBuffer(String),

    /// The type identifier embedded in a buffer cannot be mapped to a type
    /// registered with the live [`TypeRegistry`](crate::TypeRegistry).
    #[error("cannot resolve type: {0}")]
    TypeResolution(String),

    /// Key or IV material has the wrong byte length for the cipher, or is
    /// not valid base64.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Recovered padding bytes are inconsistent after decryption. Almost
    /// always means the wrong key/IV/mode was used or the ciphertext was
    /// corrupted in storage.
    #[error("padding validation failed: wrong key/IV or corrupted ciphertext")]
    PaddingValidation,

    /// Removing this key would leave the store without any usable key.
    #[error("refusing to remove the last encryption key")]
    LastKeyRemoval,

    /// Removing this IV would leave the store without any usable IV.
    #[error("refusing to remove the last initialization vector")]
    LastIvRemoval,

    /// A value could not be serialized into the envelope payload.
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// Configuration file or document could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Type alias for Results using SaveError
pub type Result<T> = std::result::Result<T, SaveError>;
