//! Storage layer for variable-length values
//!
//! This module provides:
//! - The varlena header codec and value layout
//! - The built-in LZ compressor and its strategies

pub mod compression;
pub mod varlena;

pub use compression::*;
pub use varlena::*;
