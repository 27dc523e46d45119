//! # Cryptographic Components
//!
//! Block cipher engine and rotating key material store.
//!
//! ## Components
//! - **Cipher**: AES-128 in CBC (default) or ECB mode with strict byte
//!   padding validation
//! - **KeyStore**: ordered key/IV registry with clamped "current" cursors
//!
//! ## Security
//! - Key and IV material zeroized on drop (zeroize crate)
//! - Padding failures surface as errors, never as silent garbage
//! - No shared mutable state inside the cipher engine itself

pub mod cipher;
pub mod keystore;
