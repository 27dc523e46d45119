//! # Utility Modules
//!
//! Supporting utilities for the save pipeline.
//!
//! ## Components
//! - **Compression**: LZ4 and Zstd with size limits and thresholds

pub mod compression;

pub use compression::Compression;
