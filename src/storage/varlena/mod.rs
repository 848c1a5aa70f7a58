//! Varlena storage format
//!
//! Variable-length values carry a self-describing header in front of their payload.
//! The header says how long the value is and whether the payload is stored raw,
//! compressed, or is a pointer to data kept out of line.
//!
//! ## Layout (first byte, little-endian)
//!
//! ```text
//! xxxxxx00  4-byte header, uncompressed       total length in the upper 30 bits
//! xxxxxx10  4-byte header, compressed         followed by the raw length (u32)
//! 00000001  1-byte header, external pointer   next byte is the total length
//! xxxxxxx1  1-byte header, short value        total length in the upper 7 bits
//! 00000000  padding in front of a 4-byte header
//! ```

pub mod area;
pub mod datum;
pub mod header;

pub use area::{VarlenaReader, VarlenaWriter};
pub use datum::Varlena;
pub use header::{
    classify, classify_aligned, decode_header, decode_header_aligned, decode_length,
    decode_raw_len, encode_compressed4, encode_external1, encode_header, encode_short1,
    encode_uncompressed4, HeaderError, HeaderResult, VarlenaHeader, VarlenaKind,
};
