//! Error handling for the varlena codec and the LZ compressor

use crate::storage::compression::{CorruptStream, Declined, StrategyError};
use crate::storage::varlena::HeaderError;
use thiserror::Error;

/// Main error type for varlena operations
///
/// The per-module errors stay small and specific; this enum is what callers that
/// mix header decoding, decompression and configuration get back.
#[derive(Error, Debug)]
pub enum VarlenaError {
    #[error("Header error: {0}")]
    Header(#[from] HeaderError),

    #[error("Compression declined: {0}")]
    Declined(#[from] Declined),

    #[error("Corrupt compressed data: {0}")]
    Corrupt(#[from] CorruptStream),

    #[error("Invalid strategy: {0}")]
    Strategy(#[from] StrategyError),

    #[error("External TOAST pointer cannot be resolved inline ({0} pointer bytes)")]
    ExternalPointer(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, VarlenaError>;

/// Result type alias for varlena operations (alias for Result)
pub type VarlenaResult<T> = std::result::Result<T, VarlenaError>;

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_err {
    ($msg:expr) => {
        $crate::common::error::VarlenaError::Internal($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::VarlenaError::Internal(format!($fmt, $($arg)*))
    };
}
