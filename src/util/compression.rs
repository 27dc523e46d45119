//! Optional compression of the serialized body before encryption.
//!
//! Large saves (inventories, quest logs) compress well; ciphertext does not.
//! Compression therefore runs between serialization and encryption, and the
//! kind used is recorded in the buffer's flags byte so decode is
//! self-describing. Decompression enforces an output size cap to reject
//! artifacts claiming absurd decompressed sizes.

use crate::config::MAX_SAVE_SIZE;
use crate::error::{Result, SaveError};

/// Maximum output size for decompression (aligned with MAX_SAVE_SIZE).
const MAX_DECOMPRESSION_SIZE: usize = MAX_SAVE_SIZE;

/// Compression applied to the serialized envelope body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Store the body as-is (default).
    #[default]
    None,
    /// LZ4 with prepended size (fast, moderate ratio).
    Lz4,
    /// Zstd level 1 (slower, better ratio).
    Zstd,
}

impl Compression {
    /// Flags-byte value recorded in the buffer header.
    pub fn flag_byte(self) -> u8 {
        match self {
            Compression::None => 0x00,
            Compression::Lz4 => 0x01,
            Compression::Zstd => 0x02,
        }
    }

    /// Recover the compression kind from a flags byte.
    pub fn from_flag(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Compression::None),
            0x01 => Some(Compression::Lz4),
            0x02 => Some(Compression::Zstd),
            _ => None,
        }
    }
}

/// Compresses data using the specified algorithm. `Compression::None`
/// returns the input unchanged.
///
/// # Errors
/// Returns `SaveError::Serialize` if compression fails.
pub fn compress(data: &[u8], kind: Compression) -> Result<Vec<u8>> {
    match kind {
        Compression::None => Ok(data.to_vec()),
        Compression::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        Compression::Zstd => {
            let mut out = Vec::new();
            zstd::stream::copy_encode(data, &mut out, 1)
                .map_err(|e| SaveError::Serialize(format!("zstd compression failed: {e}")))?;
            Ok(out)
        }
    }
}

/// Decompresses data that was compressed with the specified algorithm.
///
/// Enforces a maximum output size limit so a corrupted or hostile artifact
/// cannot force a giant allocation.
///
/// # Errors
/// Returns `SaveError::MalformedBuffer` if decompression fails or the output
/// exceeds the size limit.
pub fn decompress(data: &[u8], kind: Compression) -> Result<Vec<u8>> {
    match kind {
        Compression::None => Ok(data.to_vec()),
        Compression::Lz4 => {
            // Validate the claimed size before lz4_flex attempts allocation.
            if data.len() < 4 {
                return Err(SaveError::MalformedBuffer(
                    "compressed body shorter than its size header".into(),
                ));
            }
            let claimed_size = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
            if claimed_size > MAX_DECOMPRESSION_SIZE {
                return Err(SaveError::MalformedBuffer(format!(
                    "compressed body claims {claimed_size} bytes, limit is {MAX_DECOMPRESSION_SIZE}"
                )));
            }

            let decompressed = lz4_flex::decompress_size_prepended(data)
                .map_err(|e| SaveError::MalformedBuffer(format!("lz4 decompression failed: {e}")))?;
            if decompressed.len() > MAX_DECOMPRESSION_SIZE {
                return Err(SaveError::MalformedBuffer("decompressed body over size limit".into()));
            }
            Ok(decompressed)
        }
        Compression::Zstd => {
            let mut reader = zstd::stream::Decoder::new(data)
                .map_err(|e| SaveError::MalformedBuffer(format!("zstd decompression failed: {e}")))?;

            // Read in chunks to enforce the size limit.
            use std::io::Read;
            let mut out = Vec::new();
            let mut buffer = [0u8; 8192];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        out.extend_from_slice(&buffer[..n]);
                        if out.len() > MAX_DECOMPRESSION_SIZE {
                            return Err(SaveError::MalformedBuffer(
                                "decompressed body over size limit".into(),
                            ));
                        }
                    }
                    Err(e) => {
                        return Err(SaveError::MalformedBuffer(format!(
                            "zstd decompression failed: {e}"
                        )))
                    }
                }
            }
            Ok(out)
        }
    }
}

/// Compress the body if the requested kind and size threshold make it
/// worthwhile. Returns the output and the kind actually applied, which is
/// what gets recorded in the flags byte.
pub fn maybe_compress(data: &[u8], kind: Compression, threshold_bytes: usize) -> Result<(Vec<u8>, Compression)> {
    if kind == Compression::None || data.len() < threshold_bytes {
        return Ok((data.to_vec(), Compression::None));
    }
    let compressed = compress(data, kind)?;
    // Only keep the compressed form when it actually shrank the body.
    if compressed.len() < data.len() {
        Ok((compressed, kind))
    } else {
        Ok((data.to_vec(), Compression::None))
    }
}
