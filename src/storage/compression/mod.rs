//! Compression module for the varlena storage layer
//!
//! Values that do not fit comfortably in a page are run through the built-in LZ
//! compressor before they are stored. Compression is opportunistic: the strategy
//! decides which inputs are worth trying, and the compressor declines whenever the
//! result would not pay for itself.
//!
//! ## Usage Example:
//!
//! ```ignore
//! use prism_varlena::storage::compression::*;
//!
//! match compress(&raw, &CompressionStrategy::DEFAULT) {
//!     Ok(block) => store(block.to_varlena()),
//!     Err(_declined) => store_raw(&raw),
//! }
//!
//! let raw = decompress(&block, block.raw_len())?;
//! ```

pub mod lz;
pub mod strategy;
pub mod traits;
pub mod types;

pub use lz::{compress, compress_into, decompress, decompress_stream, decompress_varlena};
pub use strategy::{CompressionStrategy, StrategyConfig, StrategyError, StrategyPreset};
pub use traits::{CompressionStats, CorruptStream, DeclineReason, Declined};
pub use types::{max_output_len, CompressedBlock};
