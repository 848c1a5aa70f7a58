//! Varlena header codec
//!
//! Every variable-length value starts with a self-describing header. The two low
//! bits of the physically first byte select the kind; the remaining bits carry the
//! total length of the value, header included. The on-disk byte order is
//! little-endian:
//!
//! ```text
//! xxxxxx00  4-byte length word, uncompressed data (up to 1GB)
//! xxxxxx10  4-byte length word, compressed data (up to 1GB), then 4-byte raw size
//! 00000001  1-byte marker, external TOAST pointer; the next byte is the length
//! xxxxxxx1  1-byte length word, uncompressed data (up to 126 bytes of payload)
//! ```
//!
//! A 1-byte header is never zero, which keeps zero free to mark alignment padding
//! in front of 4-byte headers. A 4-byte header itself may start with a zero byte
//! (an uncompressed length that is a multiple of 64), so it has to be read at an
//! aligned position where padding cannot occur; see [`classify_aligned`].

use crate::common::constants::{
    VARATT_EXTERNAL_MARKER, VARATT_SHORT_MAX, VARHDRSZ, VARHDRSZ_COMPRESSED, VARHDRSZ_EXTERNAL,
    VARHDRSZ_SHORT, VARLENA_MAX_LEN,
};
use byteorder::{ByteOrder, LittleEndian};
use bytes::BufMut;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const FLAG_MASK_4B: u8 = 0x03;
const FLAG_UNCOMPRESSED_4B: u8 = 0x00;
const FLAG_COMPRESSED_4B: u8 = 0x02;
const FLAG_1B: u8 = 0x01;

/// Header decoding error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Truncated varlena: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Pad byte where a varlena header was expected")]
    PadByte,

    #[error("Varlena length {total_len} is shorter than its {header_len}-byte header")]
    LengthTooShort { total_len: u32, header_len: usize },

    #[error("Compressed raw size {0} exceeds the 1GB varlena limit")]
    RawLengthOverflow(u32),

    #[error("Expected a {expected} header, found {found}")]
    WrongKind {
        expected: VarlenaKind,
        found: VarlenaKind,
    },
}

/// Result type for header decoding
pub type HeaderResult<T> = Result<T, HeaderError>;

/// Physical representation of a varlena value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarlenaKind {
    /// 4-byte length word, plain payload
    Uncompressed4,

    /// 4-byte length word plus 4-byte raw size, LZ compressed payload
    Compressed4,

    /// 1-byte length word, plain payload of at most 126 bytes
    Short1,

    /// 1-byte marker plus 1-byte length, payload is a TOAST pointer
    External1,
}

impl VarlenaKind {
    /// Returns human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            VarlenaKind::Uncompressed4 => "Uncompressed4",
            VarlenaKind::Compressed4 => "Compressed4",
            VarlenaKind::Short1 => "Short1",
            VarlenaKind::External1 => "External1",
        }
    }

    /// Number of header bytes in front of the payload
    pub fn header_len(&self) -> usize {
        match self {
            VarlenaKind::Uncompressed4 => VARHDRSZ,
            VarlenaKind::Compressed4 => VARHDRSZ_COMPRESSED,
            VarlenaKind::Short1 => VARHDRSZ_SHORT,
            VarlenaKind::External1 => VARHDRSZ_EXTERNAL,
        }
    }

    /// Whether the header starts with a 4-byte length word
    pub fn is_4b(&self) -> bool {
        matches!(self, VarlenaKind::Uncompressed4 | VarlenaKind::Compressed4)
    }

    /// Whether the value needs detoasting before its payload is usable
    pub fn is_extended(&self) -> bool {
        !matches!(self, VarlenaKind::Uncompressed4 | VarlenaKind::Short1)
    }
}

impl std::fmt::Display for VarlenaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded varlena header
///
/// Only built through the checked constructors or by decoding, so every header
/// holds lengths its kind can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarlenaHeader {
    kind: VarlenaKind,

    /// Physical size of the value, header included
    total_len: u32,

    /// Decompressed payload size, only for `Compressed4`
    raw_len: Option<u32>,
}

impl VarlenaHeader {
    /// # Panics
    /// If `total_len` is below 4 or above 2^30-1.
    pub fn uncompressed(total_len: u32) -> Self {
        check_4b_len(total_len, VARHDRSZ);
        Self {
            kind: VarlenaKind::Uncompressed4,
            total_len,
            raw_len: None,
        }
    }

    /// # Panics
    /// If `total_len` is below 8 or either length is above 2^30-1.
    pub fn compressed(total_len: u32, raw_len: u32) -> Self {
        check_4b_len(total_len, VARHDRSZ_COMPRESSED);
        assert!(
            raw_len <= VARLENA_MAX_LEN,
            "compressed raw size {} exceeds varlena limit {}",
            raw_len,
            VARLENA_MAX_LEN
        );
        Self {
            kind: VarlenaKind::Compressed4,
            total_len,
            raw_len: Some(raw_len),
        }
    }

    /// # Panics
    /// If `total_len` is zero or does not fit in 7 bits.
    pub fn short(total_len: u32) -> Self {
        assert!(
            (VARHDRSZ_SHORT as u32..=VARATT_SHORT_MAX).contains(&total_len),
            "short varlena length {} outside 1..={}",
            total_len,
            VARATT_SHORT_MAX
        );
        Self {
            kind: VarlenaKind::Short1,
            total_len,
            raw_len: None,
        }
    }

    /// # Panics
    /// If `total_len` does not cover the 2-byte header or does not fit in a byte.
    pub fn external(total_len: u32) -> Self {
        assert!(
            (VARHDRSZ_EXTERNAL as u32..=u8::MAX as u32).contains(&total_len),
            "external varlena length {} outside {}..=255",
            total_len,
            VARHDRSZ_EXTERNAL
        );
        Self {
            kind: VarlenaKind::External1,
            total_len,
            raw_len: None,
        }
    }

    pub fn kind(&self) -> VarlenaKind {
        self.kind
    }

    /// Physical size of the value, header included
    pub fn total_len(&self) -> u32 {
        self.total_len
    }

    /// Decompressed payload size, `Some` exactly for `Compressed4`
    pub fn raw_len(&self) -> Option<u32> {
        self.raw_len
    }

    pub fn header_len(&self) -> usize {
        self.kind.header_len()
    }

    /// Size of the value excluding its header
    pub fn payload_len(&self) -> usize {
        (self.total_len as usize).saturating_sub(self.header_len())
    }

    /// Whether an uncompressed 4-byte value would fit under a 1-byte header
    pub fn can_make_short(&self) -> bool {
        self.kind == VarlenaKind::Uncompressed4
            && self.payload_len() + VARHDRSZ_SHORT <= VARATT_SHORT_MAX as usize
    }

    /// Total size after converting to a 1-byte header, if that is possible
    pub fn converted_short_size(&self) -> Option<u32> {
        if self.can_make_short() {
            Some((self.payload_len() + VARHDRSZ_SHORT) as u32)
        } else {
            None
        }
    }

    /// Serializes the header bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.header_len());
        self.write_to(&mut buf);
        buf
    }

    /// Appends the header bytes to a buffer
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        match self.kind {
            VarlenaKind::Uncompressed4 => {
                buf.put_u32_le(self.total_len << 2);
            }
            VarlenaKind::Compressed4 => {
                buf.put_u32_le((self.total_len << 2) | FLAG_COMPRESSED_4B as u32);
                buf.put_u32_le(self.raw_len.unwrap_or(0));
            }
            VarlenaKind::Short1 => {
                buf.put_u8(((self.total_len as u8) << 1) | FLAG_1B);
            }
            VarlenaKind::External1 => {
                buf.put_u8(VARATT_EXTERNAL_MARKER);
                buf.put_u8(self.total_len as u8);
            }
        }
    }
}

fn check_4b_len(total_len: u32, header_len: usize) {
    assert!(
        total_len <= VARLENA_MAX_LEN,
        "varlena length {} exceeds limit {}",
        total_len,
        VARLENA_MAX_LEN
    );
    assert!(
        total_len as usize >= header_len,
        "varlena length {} is shorter than its {}-byte header",
        total_len,
        header_len
    );
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Determines the header kind from the first byte
///
/// Returns `None` for an empty slice or a pad byte: there is no value here.
/// An `Uncompressed4` header whose total length is a multiple of 64 also starts
/// with a zero byte, so callers at a 4-byte-aligned position must use
/// [`classify_aligned`] instead.
pub fn classify(bytes: &[u8]) -> Option<VarlenaKind> {
    match bytes.first() {
        None | Some(0) => None,
        Some(&first) => Some(kind_of(first)),
    }
}

/// Determines the header kind at a 4-byte-aligned position
///
/// Padding only ever precedes a 4-byte header to reach alignment, so at an aligned
/// position a zero first byte belongs to an uncompressed 4-byte header.
pub fn classify_aligned(bytes: &[u8]) -> Option<VarlenaKind> {
    bytes.first().map(|&first| kind_of(first))
}

fn kind_of(first: u8) -> VarlenaKind {
    if first == VARATT_EXTERNAL_MARKER {
        VarlenaKind::External1
    } else if first & FLAG_1B == FLAG_1B {
        VarlenaKind::Short1
    } else if first & FLAG_MASK_4B == FLAG_UNCOMPRESSED_4B {
        VarlenaKind::Uncompressed4
    } else {
        VarlenaKind::Compressed4
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes `(header_len, total_len)` of the value at the start of `bytes`
pub fn decode_length(bytes: &[u8]) -> HeaderResult<(usize, u32)> {
    let kind = classify_or_pad(bytes)?;
    decode_length_as(kind, bytes)
}

/// Decodes the raw (decompressed) size of a `Compressed4` value
pub fn decode_raw_len(bytes: &[u8]) -> HeaderResult<u32> {
    let kind = classify_or_pad(bytes)?;
    if kind != VarlenaKind::Compressed4 {
        return Err(HeaderError::WrongKind {
            expected: VarlenaKind::Compressed4,
            found: kind,
        });
    }
    read_raw_len(bytes)
}

/// Decodes the complete header at the start of `bytes`
pub fn decode_header(bytes: &[u8]) -> HeaderResult<VarlenaHeader> {
    let kind = classify_or_pad(bytes)?;
    decode_header_as(kind, bytes)
}

/// Decodes the complete header at a 4-byte-aligned position
pub fn decode_header_aligned(bytes: &[u8]) -> HeaderResult<VarlenaHeader> {
    let kind = classify_aligned(bytes).ok_or(HeaderError::Truncated {
        needed: 1,
        available: 0,
    })?;
    decode_header_as(kind, bytes)
}

fn classify_or_pad(bytes: &[u8]) -> HeaderResult<VarlenaKind> {
    require(bytes, 1)?;
    classify(bytes).ok_or(HeaderError::PadByte)
}

fn decode_header_as(kind: VarlenaKind, bytes: &[u8]) -> HeaderResult<VarlenaHeader> {
    // Decoded lengths are range checked, so the constructors cannot panic here
    let (_, total_len) = decode_length_as(kind, bytes)?;
    let header = match kind {
        VarlenaKind::Uncompressed4 => VarlenaHeader::uncompressed(total_len),
        VarlenaKind::Compressed4 => VarlenaHeader::compressed(total_len, read_raw_len(bytes)?),
        VarlenaKind::Short1 => VarlenaHeader::short(total_len),
        VarlenaKind::External1 => VarlenaHeader::external(total_len),
    };
    Ok(header)
}

fn read_raw_len(bytes: &[u8]) -> HeaderResult<u32> {
    require(bytes, VARHDRSZ_COMPRESSED)?;
    let raw_len = LittleEndian::read_u32(&bytes[VARHDRSZ..VARHDRSZ_COMPRESSED]);
    if raw_len > VARLENA_MAX_LEN {
        return Err(HeaderError::RawLengthOverflow(raw_len));
    }
    Ok(raw_len)
}

fn decode_length_as(kind: VarlenaKind, bytes: &[u8]) -> HeaderResult<(usize, u32)> {
    let header_len = kind.header_len();
    require(bytes, header_len)?;

    let total_len = match kind {
        VarlenaKind::Uncompressed4 | VarlenaKind::Compressed4 => {
            (LittleEndian::read_u32(&bytes[..VARHDRSZ]) >> 2) & VARLENA_MAX_LEN
        }
        VarlenaKind::Short1 => ((bytes[0] >> 1) & 0x7F) as u32,
        VarlenaKind::External1 => bytes[1] as u32,
    };

    if (total_len as usize) < header_len {
        return Err(HeaderError::LengthTooShort {
            total_len,
            header_len,
        });
    }
    Ok((header_len, total_len))
}

fn require(bytes: &[u8], needed: usize) -> HeaderResult<()> {
    if bytes.len() < needed {
        return Err(HeaderError::Truncated {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// # Panics
/// If `total_len` is below 4 or above 2^30-1.
pub fn encode_uncompressed4(total_len: u32) -> [u8; 4] {
    check_4b_len(total_len, VARHDRSZ);
    let mut out = [0u8; 4];
    LittleEndian::write_u32(&mut out, total_len << 2);
    out
}

/// # Panics
/// If `total_len` is below 8 or either length is above 2^30-1.
pub fn encode_compressed4(total_len: u32, raw_len: u32) -> [u8; 8] {
    let header = VarlenaHeader::compressed(total_len, raw_len);
    let mut out = [0u8; 8];
    let word = (header.total_len << 2) | FLAG_COMPRESSED_4B as u32;
    LittleEndian::write_u32(&mut out[..4], word);
    LittleEndian::write_u32(&mut out[4..], raw_len);
    out
}

/// # Panics
/// If `total_len` is zero or above 127.
pub fn encode_short1(total_len: u32) -> [u8; 1] {
    let header = VarlenaHeader::short(total_len);
    [((header.total_len as u8) << 1) | FLAG_1B]
}

/// # Panics
/// If `total_len` is below 2 or above 255.
pub fn encode_external1(total_len: u32) -> [u8; 2] {
    let header = VarlenaHeader::external(total_len);
    [VARATT_EXTERNAL_MARKER, header.total_len as u8]
}

/// Encodes the header of any kind
///
/// `raw_len` is only read for `Compressed4`.
///
/// # Panics
/// If `total_len` does not fit the kind, or `raw_len` is missing for `Compressed4`.
pub fn encode_header(kind: VarlenaKind, total_len: u32, raw_len: Option<u32>) -> Vec<u8> {
    match kind {
        VarlenaKind::Uncompressed4 => encode_uncompressed4(total_len).to_vec(),
        VarlenaKind::Compressed4 => {
            let raw_len = raw_len.expect("Compressed4 header requires a raw length");
            encode_compressed4(total_len, raw_len).to_vec()
        }
        VarlenaKind::Short1 => encode_short1(total_len).to_vec(),
        VarlenaKind::External1 => encode_external1(total_len).to_vec(),
    }
}
