//! Explicit registry mapping logical type names to decoders.
//!
//! The registry replaces ambient runtime reflection: every savable type is
//! registered once at startup, and decode resolves the identifier embedded
//! in a buffer against the *currently running* registry rather than the
//! module token the buffer was written under. A value serialized by one
//! build therefore resolves under a later build as long as the logical type
//! name is unchanged and still registered.

use crate::core::envelope::Savable;
use crate::error::{Result, SaveError};
use std::any::Any;
use std::collections::HashMap;
use tracing::debug;

/// Monomorphized decoder stored per registered type.
type DecodeFn = fn(&[u8]) -> Result<Box<dyn Any + Send + Sync>>;

/// A resolved entry: the type's identity plus its payload decoder.
pub struct RegisteredType {
    name: &'static str,
    module: &'static str,
    decode: DecodeFn,
}

impl RegisteredType {
    /// Logical type name this entry was registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Module token recorded at registration.
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// Decode an envelope payload into the registered concrete type.
    ///
    /// # Errors
    /// Returns [`SaveError::MalformedBuffer`] when the payload is not a
    /// valid field encoding of the registered type.
    pub fn decode_payload(&self, payload: &[u8]) -> Result<Box<dyn Any + Send + Sync>> {
        (self.decode)(payload)
    }
}

/// Registry of savable types, populated at startup and injected into the
/// codec. Not process-global: tests build their own.
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<&'static str, RegisteredType>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its logical type name.
    ///
    /// Returns `false` when a type with the same name is already registered
    /// (the first registration wins).
    pub fn register<T: Savable>(&mut self) -> bool {
        fn decode_impl<T: Savable>(payload: &[u8]) -> Result<Box<dyn Any + Send + Sync>> {
            let value: T = bincode::deserialize(payload).map_err(|e| {
                SaveError::MalformedBuffer(format!(
                    "payload is not a valid '{}': {e}",
                    T::TYPE_NAME
                ))
            })?;
            Ok(Box::new(value))
        }

        if self.types.contains_key(T::TYPE_NAME) {
            return false;
        }
        self.types.insert(
            T::TYPE_NAME,
            RegisteredType {
                name: T::TYPE_NAME,
                module: T::MODULE,
                decode: decode_impl::<T>,
            },
        );
        true
    }

    /// Resolve a serialized type identifier against the live registry.
    ///
    /// Only the logical name participates in the lookup. A differing module
    /// token is tolerated — the buffer was written by another build — and
    /// logged at debug level.
    ///
    /// # Errors
    /// Returns [`SaveError::TypeResolution`] when no registered type
    /// matches the logical name.
    pub fn resolve(&self, name: &str, module: &str) -> Result<&RegisteredType> {
        let entry = self.types.get(name).ok_or_else(|| {
            SaveError::TypeResolution(format!("'{name}' is not registered"))
        })?;
        if entry.module != module {
            debug!(
                type_name = name,
                buffer_module = module,
                live_module = entry.module,
                "module token drift tolerated during resolution"
            );
        }
        Ok(entry)
    }

    /// Whether a logical name is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
