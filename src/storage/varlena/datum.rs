//! Varlena values
//!
//! A [`Varlena`] is a header plus the payload bytes behind it. This is where the
//! physical representation of a logical value gets chosen: compressed when that is
//! strictly smaller, otherwise a 1-byte header for short values and a 4-byte header
//! for everything else.

use crate::common::constants::{VARATT_SHORT_MAX, VARHDRSZ, VARHDRSZ_SHORT};
use crate::common::error::{VarlenaError, VarlenaResult};
use crate::internal_err;
use crate::storage::compression::{compress, decompress, CompressedBlock, CompressionStrategy};
use crate::storage::varlena::header::{
    decode_header, decode_header_aligned, HeaderError, HeaderResult, VarlenaHeader, VarlenaKind,
};
use bytes::{BufMut, Bytes};
use tracing::trace;

/// A variable-length value as stored in a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varlena {
    header: VarlenaHeader,
    payload: Bytes,
}

impl Varlena {
    /// Stores `raw` without compression, using a 1-byte header when it fits
    ///
    /// # Panics
    /// If `raw` is too large for a 4-byte header.
    pub fn plain(raw: &[u8]) -> Self {
        if raw.len() + VARHDRSZ_SHORT <= VARATT_SHORT_MAX as usize {
            Self::short(raw)
        } else {
            Self::uncompressed(raw)
        }
    }

    /// Stores `raw` under a 4-byte header
    ///
    /// # Panics
    /// If `raw` is too large for a 4-byte header.
    pub fn uncompressed(raw: &[u8]) -> Self {
        let total_len = u32::try_from(raw.len() + VARHDRSZ).unwrap_or(u32::MAX);
        Self {
            header: VarlenaHeader::uncompressed(total_len),
            payload: Bytes::copy_from_slice(raw),
        }
    }

    /// Stores `raw` under a 1-byte header
    ///
    /// # Panics
    /// If `raw` is longer than 126 bytes.
    pub fn short(raw: &[u8]) -> Self {
        let total_len = u32::try_from(raw.len() + VARHDRSZ_SHORT).unwrap_or(u32::MAX);
        Self {
            header: VarlenaHeader::short(total_len),
            payload: Bytes::copy_from_slice(raw),
        }
    }

    /// Wraps an external TOAST pointer
    ///
    /// # Panics
    /// If the pointer is longer than 253 bytes.
    pub fn external(pointer: &[u8]) -> Self {
        let total_len = u32::try_from(pointer.len() + 2).unwrap_or(u32::MAX);
        Self {
            header: VarlenaHeader::external(total_len),
            payload: Bytes::copy_from_slice(pointer),
        }
    }

    /// Stores a compressed block under a `Compressed4` header
    pub fn from_block(block: &CompressedBlock) -> Self {
        Self {
            header: block.varlena_header(),
            payload: Bytes::copy_from_slice(block.data()),
        }
    }

    /// Picks the smallest representation of `raw`
    ///
    /// The compressed form is only kept when it is strictly smaller than the plain
    /// one; a declined compression silently falls back to the plain form.
    ///
    /// # Panics
    /// If `raw` is too large for a 4-byte header.
    pub fn pack(raw: &[u8], strategy: &CompressionStrategy) -> Self {
        let plain = Self::plain(raw);
        match compress(raw, strategy) {
            Ok(block) if block.varlena_size() < plain.total_len() => Self::from_block(&block),
            Ok(block) => {
                trace!(
                    compressed = block.varlena_size(),
                    plain = plain.total_len(),
                    "compressed form is not smaller, storing plain"
                );
                plain
            }
            Err(_) => plain,
        }
    }

    /// Parses the value at the start of `bytes`, returns it with its physical size
    pub fn parse(bytes: &[u8]) -> HeaderResult<(Self, usize)> {
        let header = decode_header(bytes)?;
        Self::with_payload(header, bytes)
    }

    /// Parses the value at a 4-byte-aligned position
    pub fn parse_aligned(bytes: &[u8]) -> HeaderResult<(Self, usize)> {
        let header = decode_header_aligned(bytes)?;
        Self::with_payload(header, bytes)
    }

    fn with_payload(header: VarlenaHeader, bytes: &[u8]) -> HeaderResult<(Self, usize)> {
        let total = header.total_len() as usize;
        if bytes.len() < total {
            return Err(HeaderError::Truncated {
                needed: total,
                available: bytes.len(),
            });
        }
        let payload = Bytes::copy_from_slice(&bytes[header.header_len()..total]);
        Ok((Self { header, payload }, total))
    }

    pub fn header(&self) -> &VarlenaHeader {
        &self.header
    }

    pub fn kind(&self) -> VarlenaKind {
        self.header.kind()
    }

    /// Physical size, header included
    pub fn total_len(&self) -> usize {
        self.header.total_len() as usize
    }

    /// Bytes after the header, still compressed for `Compressed4`
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Size of the logical value, if it is known without fetching anything
    pub fn raw_len(&self) -> Option<usize> {
        match self.header.kind() {
            VarlenaKind::Compressed4 => self.header.raw_len().map(|len| len as usize),
            VarlenaKind::Uncompressed4 | VarlenaKind::Short1 => Some(self.payload.len()),
            VarlenaKind::External1 => None,
        }
    }

    /// Converts an uncompressed 4-byte value to a 1-byte header when it fits
    pub fn to_short(&self) -> Option<Self> {
        self.header.converted_short_size()?;
        Some(Self::short(&self.payload))
    }

    /// Appends the physical bytes of this value to a buffer
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        self.header.write_to(buf);
        buf.put_slice(&self.payload);
    }

    /// Physical bytes of this value
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.total_len());
        self.write_to(&mut buf);
        buf
    }

    /// Returns the logical value, decompressing it if needed
    ///
    /// External pointers reference chunks stored elsewhere and are reported as
    /// [`VarlenaError::ExternalPointer`].
    pub fn detoast(&self) -> VarlenaResult<Vec<u8>> {
        match self.header.kind() {
            VarlenaKind::Uncompressed4 | VarlenaKind::Short1 => Ok(self.payload.to_vec()),
            VarlenaKind::Compressed4 => {
                let raw_len = self
                    .header
                    .raw_len()
                    .ok_or_else(|| internal_err!("compressed header without raw length"))?;
                let block = CompressedBlock::new(raw_len, self.payload.to_vec());
                Ok(decompress(&block, raw_len)?)
            }
            VarlenaKind::External1 => Err(VarlenaError::ExternalPointer(self.payload.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::varlena::header::classify;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_picks_short_header() {
        let value = Varlena::plain(b"hello");
        assert_eq!(value.kind(), VarlenaKind::Short1);
        assert_eq!(value.total_len(), 6);
        assert_eq!(value.to_bytes(), b"\x0Dhello".to_vec());

        let value = Varlena::plain(&[7u8; 126]);
        assert_eq!(value.kind(), VarlenaKind::Short1);

        let value = Varlena::plain(&[7u8; 127]);
        assert_eq!(value.kind(), VarlenaKind::Uncompressed4);
        assert_eq!(value.total_len(), 131);
    }

    #[test]
    fn test_same_length_two_encodings() {
        let short = Varlena::short(b"12345").to_bytes();
        let long = Varlena::uncompressed(b"12345").to_bytes();
        assert_eq!(classify(&short), Some(VarlenaKind::Short1));
        assert_eq!(classify(&long), Some(VarlenaKind::Uncompressed4));
        assert_eq!(Varlena::parse(&short).unwrap().0.detoast().unwrap(), b"12345");
        assert_eq!(Varlena::parse(&long).unwrap().0.detoast().unwrap(), b"12345");
    }

    #[test]
    fn test_pack_compresses_repetitive_data() {
        let raw = vec![b'A'; 1000];
        let value = Varlena::pack(&raw, &CompressionStrategy::DEFAULT);
        assert_eq!(value.kind(), VarlenaKind::Compressed4);
        assert!(value.total_len() < raw.len() + VARHDRSZ);
        assert_eq!(value.raw_len(), Some(1000));
        assert_eq!(value.detoast().unwrap(), raw);
    }

    #[test]
    fn test_pack_falls_back_to_plain() {
        let raw: Vec<u8> = (0..200u8).collect();
        let value = Varlena::pack(&raw, &CompressionStrategy::DEFAULT);
        assert_eq!(value.kind(), VarlenaKind::Uncompressed4);
        assert_eq!(value.detoast().unwrap(), raw);

        // Compressible, but a 1-byte header beats the 8-byte compressed header
        let raw = vec![b'x'; 8];
        let value = Varlena::pack(&raw, &CompressionStrategy::ALWAYS);
        assert_eq!(value.kind(), VarlenaKind::Short1);
    }

    #[test]
    fn test_parse_reports_consumed_length() {
        let mut bytes = Varlena::plain(b"abc").to_bytes();
        bytes.extend_from_slice(b"trailing");
        let (value, consumed) = Varlena::parse(&bytes).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(&value.payload()[..], b"abc");
    }

    #[test]
    fn test_parse_truncated_payload() {
        let bytes = Varlena::uncompressed(&[1u8; 50]).to_bytes();
        assert_eq!(
            Varlena::parse(&bytes[..20]),
            Err(HeaderError::Truncated {
                needed: 54,
                available: 20
            })
        );
    }

    #[test]
    fn test_parse_aligned_zero_first_byte() {
        // 60 payload bytes + 4 header bytes = 64, whose header starts with 0x00
        let value = Varlena::uncompressed(&[9u8; 60]);
        let bytes = value.to_bytes();
        assert_eq!(bytes[0], 0);
        assert_eq!(Varlena::parse(&bytes), Err(HeaderError::PadByte));
        assert_eq!(Varlena::parse_aligned(&bytes).unwrap().0, value);
    }

    #[test]
    fn test_external_pointer() {
        let pointer = [0xABu8; 16];
        let value = Varlena::external(&pointer);
        let bytes = value.to_bytes();
        assert_eq!(&bytes[..2], &[0x01, 18]);

        let (parsed, consumed) = Varlena::parse(&bytes).unwrap();
        assert_eq!(consumed, 18);
        assert_eq!(parsed.kind(), VarlenaKind::External1);
        assert_eq!(parsed.raw_len(), None);
        assert!(matches!(
            parsed.detoast(),
            Err(VarlenaError::ExternalPointer(16))
        ));
    }

    #[test]
    fn test_to_short() {
        let value = Varlena::uncompressed(b"tiny");
        let short = value.to_short().unwrap();
        assert_eq!(short.kind(), VarlenaKind::Short1);
        assert_eq!(short.total_len(), 5);
        assert_eq!(short.detoast().unwrap(), b"tiny");

        assert!(Varlena::uncompressed(&[0u8; 200]).to_short().is_none());
        assert!(Varlena::short(b"x").to_short().is_none());
    }

    #[test]
    fn test_corrupt_compressed_payload() {
        let block = CompressedBlock::new(10, vec![0b10, b'a', 0x00]);
        let value = Varlena::from_block(&block);
        assert!(matches!(value.detoast(), Err(VarlenaError::Corrupt(_))));
    }
}
