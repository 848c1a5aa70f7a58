//! LZ decompressor
//!
//! A single forward pass over the tag/literal stream. Matches are copied one byte
//! at a time from the output produced so far, which is what makes an offset shorter
//! than the length expand into a repeating run.

use crate::common::constants::VARLENA_MAX_LEN;
use crate::common::error::VarlenaResult;
use crate::storage::compression::lz::format::read_tag;
use crate::storage::compression::traits::CorruptStream;
use crate::storage::compression::types::CompressedBlock;
use tracing::trace;

/// Decompresses `block`, which must expand to exactly `expected_raw_len` bytes
pub fn decompress(
    block: &CompressedBlock,
    expected_raw_len: u32,
) -> Result<Vec<u8>, CorruptStream> {
    if block.raw_len() != expected_raw_len {
        return Err(CorruptStream::new(
            0,
            format!(
                "block raw size {} does not match expected size {}",
                block.raw_len(),
                expected_raw_len
            ),
        ));
    }
    decompress_stream(block.data(), expected_raw_len as usize).inspect_err(|err| {
        trace!(expected_raw_len, error = %err, "corrupt compressed stream");
    })
}

/// Decompresses a complete `Compressed4` varlena
pub fn decompress_varlena(bytes: &[u8]) -> VarlenaResult<Vec<u8>> {
    let block = CompressedBlock::from_varlena(bytes)?;
    Ok(decompress(&block, block.raw_len())?)
}

/// Decodes a raw tag/literal stream into `expected` bytes
pub fn decompress_stream(stream: &[u8], expected: usize) -> Result<Vec<u8>, CorruptStream> {
    if expected > VARLENA_MAX_LEN as usize {
        return Err(CorruptStream::new(
            0,
            format!("expected size {} exceeds the 1GB varlena limit", expected),
        ));
    }

    let mut out: Vec<u8> = Vec::with_capacity(expected);
    let mut pos = 0;

    while pos < stream.len() {
        let ctrl = stream[pos];
        pos += 1;
        if pos == stream.len() {
            return Err(CorruptStream::new(pos - 1, "control byte without items"));
        }

        for bit in 0..8 {
            if pos >= stream.len() {
                break;
            }

            if ctrl & (1 << bit) != 0 {
                let tag_start = pos;
                let (offset, len) = read_tag(stream, &mut pos)?;
                if offset == 0 {
                    return Err(CorruptStream::new(tag_start, "match offset is zero"));
                }
                if offset > out.len() {
                    return Err(CorruptStream::new(
                        tag_start,
                        format!("match offset {} exceeds {} decoded bytes", offset, out.len()),
                    ));
                }
                if out.len() + len > expected {
                    return Err(CorruptStream::new(
                        tag_start,
                        format!(
                            "match of {} bytes overruns the expected size {}",
                            len, expected
                        ),
                    ));
                }

                // Byte by byte: the source may overlap the bytes being written
                let from = out.len() - offset;
                for i in 0..len {
                    let byte = out[from + i];
                    out.push(byte);
                }
            } else {
                if out.len() >= expected {
                    return Err(CorruptStream::new(
                        pos,
                        format!("literal overruns the expected size {}", expected),
                    ));
                }
                out.push(stream[pos]);
                pos += 1;
            }
        }
    }

    if out.len() != expected {
        return Err(CorruptStream::new(
            pos,
            format!(
                "stream ended after {} of {} expected bytes",
                out.len(),
                expected
            ),
        ));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::VarlenaError;
    use crate::storage::compression::lz::compress::compress;
    use crate::storage::compression::strategy::CompressionStrategy;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overlapping_copy_expands_run() {
        // literal 'z', then offset 1 length 50
        let stream = [0b10, b'z', 0x1F, 32];
        let out = decompress_stream(&stream, 51).unwrap();
        assert_eq!(out, vec![b'z'; 51]);
    }

    #[test]
    fn test_overlapping_pattern() {
        // "ab" then offset 2 length 6 -> "abababab"
        let stream = [0b100, b'a', b'b', 0x23];
        assert_eq!(decompress_stream(&stream, 8).unwrap(), b"abababab".to_vec());
    }

    #[test]
    fn test_zero_offset_is_corrupt() {
        let stream = [0b10, b'a', 0x00];
        let err = decompress_stream(&stream, 4).unwrap_err();
        assert_eq!(err, CorruptStream::new(2, "match offset is zero"));
    }

    #[test]
    fn test_offset_past_output_is_corrupt() {
        // offset 2 with only one byte decoded
        let stream = [0b10, b'a', 0x20];
        let err = decompress_stream(&stream, 4).unwrap_err();
        assert_eq!(err.message, "match offset 2 exceeds 1 decoded bytes");
    }

    #[test]
    fn test_match_overrun_is_corrupt() {
        let stream = [0b10, b'a', 0x1F, 32];
        let err = decompress_stream(&stream, 10).unwrap_err();
        assert_eq!(err.message, "match of 50 bytes overruns the expected size 10");
    }

    #[test]
    fn test_literal_overrun_is_corrupt() {
        let stream = [0x00, b'a', b'b', b'c'];
        let err = decompress_stream(&stream, 2).unwrap_err();
        assert_eq!(err.message, "literal overruns the expected size 2");
    }

    #[test]
    fn test_short_stream_is_corrupt() {
        let stream = [0x00, b'a', b'b'];
        let err = decompress_stream(&stream, 5).unwrap_err();
        assert_eq!(err.message, "stream ended after 2 of 5 expected bytes");
    }

    #[test]
    fn test_trailing_control_byte_is_corrupt() {
        // eight literals fill the output, then a control byte with nothing behind it
        let mut stream = vec![0x00];
        stream.extend_from_slice(b"abcdefgh");
        stream.push(0xFF);
        let err = decompress_stream(&stream, 8).unwrap_err();
        assert_eq!(err, CorruptStream::new(9, "control byte without items"));

        stream.pop();
        assert_eq!(decompress_stream(&stream, 8).unwrap(), b"abcdefgh".to_vec());
    }

    #[test]
    fn test_raw_len_mismatch_is_corrupt() {
        let block = compress(&[b'q'; 100], &CompressionStrategy::ALWAYS).unwrap();
        let err = decompress(&block, 99).unwrap_err();
        assert_eq!(err.position, 0);
        assert_eq!(decompress(&block, 100).unwrap(), vec![b'q'; 100]);
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(decompress_stream(&[], 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decompress_varlena() {
        let raw = b"varlena varlena varlena varlena varlena".to_vec();
        let block = compress(&raw, &CompressionStrategy::ALWAYS).unwrap();
        assert_eq!(decompress_varlena(&block.to_varlena()).unwrap(), raw);

        let err = decompress_varlena(&[0x10, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, VarlenaError::Header(_)));
    }
}
