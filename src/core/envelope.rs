//! Self-describing serialized buffer format.
//!
//! A savable value is serialized into an [`Envelope`] carrying its logical
//! type identifier next to the bincode payload, then framed:
//!
//! ```text
//! [Magic(4)] [Version(1)] [Flags(1)] [Body(N)]
//! ```
//!
//! Body is the bincode encoding of the envelope, optionally compressed per
//! the flags byte. Bincode runs in its legacy mode — fixed-width integers,
//! little-endian — in both directions, so a buffer written on one machine
//! decodes identically on any other; floating-point fields travel as their
//! IEEE-754 bits. Decode either fully reconstructs the envelope or fails
//! with [`SaveError::MalformedBuffer`]; a buffer is never partially valid.
//!
//! The object graph reachable from the root must be acyclic: serialization
//! is recursive descent with no back-reference table, so shared or cyclic
//! references are not supported.

use crate::config::{COMPRESSION_THRESHOLD, FORMAT_VERSION, MAX_SAVE_SIZE, SAVE_MAGIC};
use crate::error::{Result, SaveError};
use crate::util::compression::{self, Compression};
use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Frame header length: magic + version + flags.
const HEADER_LEN: usize = SAVE_MAGIC.len() + 2;

/// Capability tag for values eligible for the save serialization format.
///
/// Implementing `Savable` declares a logical type identifier that is stable
/// across builds: [`Savable::TYPE_NAME`] names the type, and
/// [`Savable::MODULE`] records the module it was defined in. Resolution at
/// decode time matches the name against the live registry only, so renaming
/// a crate or moving a module does not invalidate old saves — renaming the
/// logical type does.
///
/// ```
/// use save_codec::Savable;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct PlayerState {
///     hp: f32,
///     items: Vec<String>,
/// }
///
/// impl Savable for PlayerState {
///     const TYPE_NAME: &'static str = "PlayerState";
///     const MODULE: &'static str = "my-game";
/// }
/// ```
pub trait Savable: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Logical type name embedded in every buffer holding this type.
    const TYPE_NAME: &'static str;

    /// Originating-module token. Informational: compared at decode time and
    /// logged on drift, but never required to match.
    const MODULE: &'static str = "";
}

/// The self-describing payload of a serialized buffer: the logical type
/// identifier plus the value's own field encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Logical type name of the serialized value.
    pub type_name: String,
    /// Module token of the build that wrote the buffer.
    pub module: String,
    /// Bincode encoding of the value's fields.
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Wrap a savable value into an envelope.
    ///
    /// # Errors
    /// Returns [`SaveError::Serialize`] if the value cannot be encoded.
    pub fn wrap<T: Savable>(value: &T) -> Result<Self> {
        let payload = bincode::serialize(value)
            .map_err(|e| SaveError::Serialize(format!("{}: {e}", T::TYPE_NAME)))?;
        Ok(Self {
            type_name: T::TYPE_NAME.to_string(),
            module: T::MODULE.to_string(),
            payload,
        })
    }
}

/// Serialize an envelope into a framed buffer, compressing the body when
/// the requested kind and size threshold make it worthwhile.
pub fn seal(envelope: &Envelope, compression: Compression) -> Result<Vec<u8>> {
    let body = bincode::serialize(envelope)
        .map_err(|e| SaveError::Serialize(format!("envelope: {e}")))?;
    let (body, applied) = compression::maybe_compress(&body, compression, COMPRESSION_THRESHOLD)?;

    let mut buf = BytesMut::with_capacity(HEADER_LEN + body.len());
    buf.put_slice(&SAVE_MAGIC);
    buf.put_u8(FORMAT_VERSION);
    buf.put_u8(applied.flag_byte());
    buf.put_slice(&body);
    Ok(buf.to_vec())
}

/// Parse a framed buffer back into its envelope.
///
/// # Errors
/// Returns [`SaveError::MalformedBuffer`] when the buffer is truncated, the
/// magic or version does not match, the flags byte is unknown, or the body
/// fails to decompress or decode.
pub fn open(bytes: &[u8]) -> Result<Envelope> {
    if bytes.len() < HEADER_LEN {
        return Err(SaveError::MalformedBuffer(format!(
            "{} bytes is shorter than the frame header",
            bytes.len()
        )));
    }
    if bytes.len() > MAX_SAVE_SIZE {
        return Err(SaveError::MalformedBuffer(format!(
            "{} bytes exceeds the maximum save size",
            bytes.len()
        )));
    }
    if bytes[..SAVE_MAGIC.len()] != SAVE_MAGIC {
        return Err(SaveError::MalformedBuffer("missing save magic".into()));
    }
    let version = bytes[SAVE_MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(SaveError::MalformedBuffer(format!(
            "unsupported format version {version}"
        )));
    }
    let flags = bytes[SAVE_MAGIC.len() + 1];
    let compression = Compression::from_flag(flags)
        .ok_or_else(|| SaveError::MalformedBuffer(format!("unknown flags byte {flags:#04x}")))?;

    let body = compression::decompress(&bytes[HEADER_LEN..], compression)?;
    bincode::deserialize(&body)
        .map_err(|e| SaveError::MalformedBuffer(format!("envelope does not decode: {e}")))
}
