//! Built-in LZ compression for varlena payloads
//!
//! A greedy LZ77 compressor tuned for bounded effort rather than the best ratio,
//! and its decompressor. See `format` for the tag/literal stream layout.

pub mod compress;
pub mod decompress;
pub mod format;
mod history;

pub use compress::{compress, compress_into};
pub use decompress::{decompress, decompress_stream, decompress_varlena};
pub use format::{MAX_MATCH, MIN_MATCH};
