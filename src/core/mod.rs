//! # Core Serialization Components
//!
//! Self-describing buffer format and type resolution.
//!
//! This module provides the foundation of the save format: the envelope
//! framing that makes a buffer reconstructable without an external schema,
//! and the registry that maps persisted type identifiers back to live types.
//!
//! ## Components
//! - **Envelope**: framed, self-describing value encoding
//! - **Registry**: logical-name type resolution tolerating build drift
//!
//! ## Buffer Format
//! ```text
//! [Magic(4)] [Version(1)] [Flags(1)] [Body(N)]
//! ```
//!
//! ## Integrity
//! - Maximum buffer size: 16MB (prevents memory exhaustion)
//! - Magic bytes prevent accidental misinterpretation
//! - Fixed little-endian byte order in both directions

pub mod envelope;
pub mod registry;
