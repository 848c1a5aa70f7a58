//! Tag/literal stream format
//!
//! Items are grouped in eights behind a control byte. Bit `i` of the control byte
//! (least significant first) tells whether item `i` is a match tag (1) or a single
//! literal byte (0).
//!
//! A match tag is one to seven bytes:
//!
//! ```text
//! byte 0:  [c | o2 o1 o0 | l3 l2 l1 l0]
//!          l = match length - 3 (15 means an extra length byte follows)
//!          o = offset bits 0-2
//!          c = the rest of the offset follows as LEB128
//! [LEB128 offset >> 3]   when c is set, at most 5 bytes
//! [length - 18]          when l == 15
//! ```
//!
//! Offsets are measured backwards from the current output position and are not
//! limited to a window: matches may reach anywhere into the bytes already produced.

use crate::storage::compression::traits::CorruptStream;
use bytes::BufMut;

/// Shortest match worth a tag
pub const MIN_MATCH: usize = 3;

/// Longest match a single tag can express
pub const MAX_MATCH: usize = MIN_MATCH + LEN_CODE_EXTENDED as usize + u8::MAX as usize;

/// Longest LEB128 offset continuation a decoder accepts
pub const MAX_OFFSET_VARINT_BYTES: usize = 5;

const LEN_CODE_EXTENDED: u8 = 0x0F;
const OFFSET_LOW_BITS: u32 = 3;
const OFFSET_LOW_MASK: u32 = (1 << OFFSET_LOW_BITS) - 1;
const OFFSET_CONTINUES: u8 = 0x80;
const VARINT_CONTINUES: u8 = 0x80;

/// Appends items to a tag/literal stream, managing control bytes
pub(crate) struct TagWriter {
    out: Vec<u8>,
    ctrl_pos: usize,
    ctrl_mask: u16,
}

impl TagWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
            ctrl_pos: 0,
            // Forces a fresh control byte before the first item
            ctrl_mask: 0x100,
        }
    }

    /// Bytes written so far, control bytes included
    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn push_literal(&mut self, byte: u8) {
        self.next_item(false);
        self.out.push(byte);
    }

    pub fn push_match(&mut self, offset: usize, len: usize) {
        debug_assert!(offset > 0, "match offset must be positive");
        debug_assert!((MIN_MATCH..=MAX_MATCH).contains(&len));
        self.next_item(true);

        let offset = offset as u32;
        let len_code = (len - MIN_MATCH).min(LEN_CODE_EXTENDED as usize) as u8;
        let high = offset >> OFFSET_LOW_BITS;
        let mut first = len_code | (((offset & OFFSET_LOW_MASK) as u8) << 4);
        if high != 0 {
            first |= OFFSET_CONTINUES;
        }
        self.out.push(first);

        if high != 0 {
            write_varint(&mut self.out, high);
        }
        if len_code == LEN_CODE_EXTENDED {
            self.out.push((len - MIN_MATCH - LEN_CODE_EXTENDED as usize) as u8);
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }

    fn next_item(&mut self, is_tag: bool) {
        if self.ctrl_mask == 0x100 {
            self.ctrl_pos = self.out.len();
            self.out.push(0);
            self.ctrl_mask = 1;
        }
        if is_tag {
            self.out[self.ctrl_pos] |= self.ctrl_mask as u8;
        }
        self.ctrl_mask <<= 1;
    }
}

fn write_varint(buf: &mut impl BufMut, mut value: u32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= VARINT_CONTINUES;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Reads the match tag starting at `*pos`, returns `(offset, length)`
///
/// Advances `*pos` past the tag. Offsets are returned as decoded; checking them
/// against the output produced so far is the caller's job.
pub(crate) fn read_tag(stream: &[u8], pos: &mut usize) -> Result<(usize, usize), CorruptStream> {
    let start = *pos;
    let first = next_byte(stream, pos, start)?;

    let len_code = first & LEN_CODE_EXTENDED;
    let mut offset = ((first >> 4) as u64) & OFFSET_LOW_MASK as u64;

    if first & OFFSET_CONTINUES != 0 {
        let mut shift = OFFSET_LOW_BITS;
        let mut consumed = 0;
        loop {
            if consumed == MAX_OFFSET_VARINT_BYTES {
                return Err(CorruptStream::new(start, "match offset varint is too long"));
            }
            let byte = next_byte(stream, pos, start)?;
            consumed += 1;
            offset |= ((byte & 0x7F) as u64) << shift;
            shift += 7;
            if byte & VARINT_CONTINUES == 0 {
                break;
            }
        }
    }

    let mut len = MIN_MATCH + len_code as usize;
    if len_code == LEN_CODE_EXTENDED {
        len += next_byte(stream, pos, start)? as usize;
    }

    Ok((offset as usize, len))
}

fn next_byte(stream: &[u8], pos: &mut usize, tag_start: usize) -> Result<u8, CorruptStream> {
    let byte = *stream
        .get(*pos)
        .ok_or_else(|| CorruptStream::new(tag_start, "match tag is truncated"))?;
    *pos += 1;
    Ok(byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single_tag(offset: usize, len: usize) -> Vec<u8> {
        let mut writer = TagWriter::with_capacity(16);
        writer.push_match(offset, len);
        writer.finish()
    }

    #[test]
    fn test_max_match() {
        assert_eq!(MAX_MATCH, 273);
    }

    #[test]
    fn test_short_tag_layout() {
        // control byte with bit 0 set, then len 3 / offset 1 in one byte
        assert_eq!(single_tag(1, 3), vec![0x01, 0x10]);
        // offset 7 still fits in the first byte, len 17 is the last direct code
        assert_eq!(single_tag(7, 17), vec![0x01, 0x7E]);
    }

    #[test]
    fn test_long_offset_and_length_layout() {
        // offset 1000 = 0b1111101_000: low bits 0, continuation 125
        // len 273: code 15 plus extension byte 255
        assert_eq!(single_tag(1000, 273), vec![0x01, 0x8F, 0x7D, 0xFF]);

        // offset 1 << 20 needs a multi-byte continuation
        let bytes = single_tag(1 << 20, 18);
        let mut pos = 1;
        assert_eq!(read_tag(&bytes, &mut pos).unwrap(), (1 << 20, 18));
        assert_eq!(pos, bytes.len());
    }

    #[test]
    fn test_control_bytes_every_eight_items() {
        let mut writer = TagWriter::with_capacity(32);
        for byte in 0..8u8 {
            writer.push_literal(byte);
        }
        writer.push_match(2, 3);
        let stream = writer.finish();
        assert_eq!(stream[0], 0x00);
        assert_eq!(&stream[1..9], &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(stream[9], 0x01);
        assert_eq!(stream[10], 0x20);
        assert_eq!(stream.len(), 11);
    }

    #[test]
    fn test_read_tag_round_trips() {
        for &(offset, len) in &[(1, 3), (8, 4), (4095, 18), (65536, 100), (0x3FFF_FFFF, 273)] {
            let bytes = single_tag(offset, len);
            let mut pos = 1;
            assert_eq!(read_tag(&bytes, &mut pos).unwrap(), (offset, len));
        }
    }

    #[test]
    fn test_read_tag_truncated() {
        let bytes = single_tag(1000, 273);
        let mut pos = 1;
        let err = read_tag(&bytes[..3], &mut pos).unwrap_err();
        assert_eq!(err, CorruptStream::new(1, "match tag is truncated"));
    }

    #[test]
    fn test_read_tag_overlong_varint() {
        let bytes = [0x80, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let mut pos = 0;
        let err = read_tag(&bytes, &mut pos).unwrap_err();
        assert_eq!(err.message, "match offset varint is too long");
    }
}
