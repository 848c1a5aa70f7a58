//! Attribute area layout
//!
//! Several varlena values stored back to back, the way a row keeps its
//! variable-length columns:
//! - 1-byte headers (short values, external pointers) are stored unaligned
//! - 4-byte headers start on a 4-byte boundary, preceded by zero pad bytes
//!
//! Reading relies on 1-byte headers never being zero: at an unaligned position a
//! zero byte can only be padding. At an aligned position there is never padding,
//! so the header is read as is even if its first byte happens to be zero.
//! Alignment is relative to the start of the area.

use crate::common::constants::VARLENA_ALIGNMENT;
use crate::common::helper::{align_value, is_aligned};
use crate::storage::varlena::datum::Varlena;
use crate::storage::varlena::header::HeaderResult;
use bytes::{BufMut, Bytes, BytesMut};

/// Builds an attribute area
#[derive(Debug, Default)]
pub struct VarlenaWriter {
    buf: BytesMut,
}

impl VarlenaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Appends a value, returns the offset of its header
    pub fn push(&mut self, value: &Varlena) -> usize {
        if value.kind().is_4b() {
            let aligned = align_value(self.buf.len(), VARLENA_ALIGNMENT);
            self.buf.put_bytes(0, aligned - self.buf.len());
        }
        let offset = self.buf.len();
        value.write_to(&mut self.buf);
        offset
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Walks the values of an attribute area in order
pub struct VarlenaReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VarlenaReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the next byte to be read
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Skips pad bytes, returns the offset of the next header if there is one
    fn next_header(&mut self) -> Option<usize> {
        while self.pos < self.data.len() {
            if is_aligned(self.pos, VARLENA_ALIGNMENT) || self.data[self.pos] != 0 {
                return Some(self.pos);
            }
            self.pos = align_value(self.pos, VARLENA_ALIGNMENT);
        }
        None
    }
}

impl Iterator for VarlenaReader<'_> {
    type Item = HeaderResult<Varlena>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_header()?;
        let rest = &self.data[start..];
        let parsed = if is_aligned(start, VARLENA_ALIGNMENT) {
            Varlena::parse_aligned(rest)
        } else {
            Varlena::parse(rest)
        };

        match parsed {
            Ok((value, consumed)) => {
                self.pos = start + consumed;
                Some(Ok(value))
            }
            Err(err) => {
                // Nothing after a bad header can be located reliably
                self.pos = self.data.len();
                Some(Err(err))
            }
        }
    }
}
