//! Constants used throughout the varlena codec

/// Size of a 4-byte varlena length word
pub const VARHDRSZ: usize = 4;

/// Size of a 1-byte (short) varlena header
pub const VARHDRSZ_SHORT: usize = 1;

/// Size of an external TOAST pointer header (marker byte + length byte)
pub const VARHDRSZ_EXTERNAL: usize = 2;

/// Size of the compressed inline header: length word + raw size word
pub const VARHDRSZ_COMPRESSED: usize = 8;

/// Largest total length a 4-byte header can describe (1GB - 1)
pub const VARLENA_MAX_LEN: u32 = 0x3FFF_FFFF;

/// Largest total length a short header can describe, header byte included
pub const VARATT_SHORT_MAX: u32 = 0x7F;

/// Marker byte of an external TOAST pointer
pub const VARATT_EXTERNAL_MARKER: u8 = 0x01;

/// Alignment of 4-byte varlena headers inside an attribute area
pub const VARLENA_ALIGNMENT: usize = 4;

/// Slack the compressor may overrun its input size by before giving up
pub const COMPRESS_OVERRUN_SLACK: usize = 4;
