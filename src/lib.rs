//! PrismDB varlena - variable-length value storage
//!
//! The on-disk format PrismDB uses for variable-length values: a self-describing
//! header (1 or 4 bytes) in front of the payload, plus the built-in LZ compressor
//! that shrinks large payloads before they are stored.
//!
pub mod common;
pub mod storage;

// Re-export common types for convenience
pub use common::{VarlenaError, VarlenaResult};

// Re-export compression for convenience
pub use storage::compression::{
    compress, compress_into, decompress, decompress_stream, decompress_varlena, max_output_len,
    CompressedBlock, CompressionStats, CompressionStrategy, CorruptStream, DeclineReason, Declined,
    StrategyConfig, StrategyError, StrategyPreset,
};

// Re-export the varlena format for convenience
pub use storage::varlena::{
    classify, classify_aligned, decode_header, decode_header_aligned, decode_length,
    decode_raw_len, encode_compressed4, encode_external1, encode_header, encode_short1,
    encode_uncompressed4, HeaderError, HeaderResult, Varlena, VarlenaHeader, VarlenaKind,
    VarlenaReader, VarlenaWriter,
};
