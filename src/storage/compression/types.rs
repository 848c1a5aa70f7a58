//! Compressed block type
//!
//! A `CompressedBlock` is the compressor's output: the original size plus the
//! tag/literal stream. Inside a page it is stored as a `Compressed4` varlena, which
//! puts the raw size right after the length word.

use crate::common::constants::{COMPRESS_OVERRUN_SLACK, VARHDRSZ_COMPRESSED};
use crate::storage::compression::traits::CompressionStats;
use crate::storage::varlena::header::{
    decode_header, HeaderError, HeaderResult, VarlenaHeader, VarlenaKind,
};
use serde::{Deserialize, Serialize};

/// Compressed data together with its decompressed size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedBlock {
    /// Size of the data after decompression
    raw_len: u32,

    /// Tag/literal stream
    data: Vec<u8>,
}

impl CompressedBlock {
    /// Creates a block from a raw size and a compressed stream
    pub fn new(raw_len: u32, data: Vec<u8>) -> Self {
        Self { raw_len, data }
    }

    pub fn raw_len(&self) -> u32 {
        self.raw_len
    }

    /// Tag/literal stream
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Physical size of this block stored as a `Compressed4` varlena
    pub fn varlena_size(&self) -> usize {
        VARHDRSZ_COMPRESSED + self.data.len()
    }

    /// Header this block gets when stored as a varlena
    pub fn varlena_header(&self) -> VarlenaHeader {
        VarlenaHeader::compressed(self.varlena_size() as u32, self.raw_len)
    }

    /// Writes the block as a `Compressed4` varlena, returns the bytes written
    ///
    /// # Panics
    /// If `dst` is shorter than `varlena_size()`.
    pub fn write_varlena(&self, dst: &mut [u8]) -> usize {
        let size = self.varlena_size();
        assert!(
            dst.len() >= size,
            "output buffer of {} bytes cannot hold {} bytes",
            dst.len(),
            size
        );
        dst[..VARHDRSZ_COMPRESSED].copy_from_slice(&self.varlena_header().encode());
        dst[VARHDRSZ_COMPRESSED..size].copy_from_slice(&self.data);
        size
    }

    /// Serializes the block as a `Compressed4` varlena
    pub fn to_varlena(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.varlena_size());
        self.varlena_header().write_to(&mut buf);
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Reads a block back from a `Compressed4` varlena
    pub fn from_varlena(bytes: &[u8]) -> HeaderResult<Self> {
        let header = decode_header(bytes)?;
        if header.kind() != VarlenaKind::Compressed4 {
            return Err(HeaderError::WrongKind {
                expected: VarlenaKind::Compressed4,
                found: header.kind(),
            });
        }
        let total = header.total_len() as usize;
        if bytes.len() < total {
            return Err(HeaderError::Truncated {
                needed: total,
                available: bytes.len(),
            });
        }
        Ok(Self {
            raw_len: header.raw_len().unwrap_or(0),
            data: bytes[VARHDRSZ_COMPRESSED..total].to_vec(),
        })
    }
}

impl CompressionStats for CompressedBlock {
    fn uncompressed_size(&self) -> usize {
        self.raw_len as usize
    }

    fn compressed_size(&self) -> usize {
        self.data.len()
    }
}

/// Output buffer size a caller must provide to compress `input_len` bytes into a
/// `Compressed4` varlena
pub fn max_output_len(input_len: usize) -> usize {
    input_len + COMPRESS_OVERRUN_SLACK + VARHDRSZ_COMPRESSED
}
