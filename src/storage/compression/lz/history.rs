//! History table for the LZ match finder
//!
//! Positions are bucketed by a hash of the four bytes starting there. `head` holds
//! the most recent position per bucket and `prev` chains every position to the
//! previous one in its bucket, so walking a chain visits candidates newest first.
//! Both tables are plain index arrays sized for one input and dropped with it.

use crate::common::helper::next_power_of_two;

const NO_POSITION: u32 = u32::MAX;
const MIN_BUCKETS: usize = 512;
const MAX_BUCKETS: usize = 8192;

pub(crate) struct History {
    head: Vec<u32>,
    prev: Vec<u32>,
    mask: usize,
}

impl History {
    /// Creates an empty history for an input of `input_len` bytes
    ///
    /// Small inputs get a small bucket table so clearing it does not dominate.
    pub fn new(input_len: usize) -> Self {
        let buckets =
            next_power_of_two(input_len.saturating_mul(4)).clamp(MIN_BUCKETS, MAX_BUCKETS);
        Self {
            head: vec![NO_POSITION; buckets],
            prev: vec![NO_POSITION; input_len],
            mask: buckets - 1,
        }
    }

    #[inline]
    fn bucket(&self, input: &[u8], pos: usize) -> usize {
        let hash = if pos + 4 <= input.len() {
            ((input[pos] as usize) << 6)
                ^ ((input[pos + 1] as usize) << 4)
                ^ ((input[pos + 2] as usize) << 2)
                ^ input[pos + 3] as usize
        } else {
            input[pos] as usize
        };
        hash & self.mask
    }

    /// Records `pos` as the newest entry of its bucket
    ///
    /// Positions must be inserted in increasing order.
    pub fn insert(&mut self, input: &[u8], pos: usize) {
        let bucket = self.bucket(input, pos);
        self.prev[pos] = self.head[bucket];
        self.head[bucket] = pos as u32;
    }

    /// Earlier positions sharing a bucket with `pos`, newest first
    pub fn candidates(&self, input: &[u8], pos: usize) -> Candidates<'_> {
        Candidates {
            prev: &self.prev,
            next: self.head[self.bucket(input, pos)],
        }
    }
}

pub(crate) struct Candidates<'a> {
    prev: &'a [u32],
    next: u32,
}

impl Iterator for Candidates<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next == NO_POSITION {
            return None;
        }
        let current = self.next as usize;
        self.next = self.prev[current];
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bucket_table_size() {
        assert_eq!(History::new(10).head.len(), MIN_BUCKETS);
        assert_eq!(History::new(200).head.len(), 1024);
        assert_eq!(History::new(100_000).head.len(), MAX_BUCKETS);
    }

    #[test]
    fn test_candidates_newest_first() {
        let input = b"abcdXabcdYabcdZ";
        let mut history = History::new(input.len());
        for pos in 0..10 {
            history.insert(input, pos);
        }
        let found: Vec<usize> = history
            .candidates(input, 10)
            .filter(|&c| &input[c..c + 4] == b"abcd")
            .collect();
        assert_eq!(found, vec![5, 0]);
    }

    #[test]
    fn test_empty_history_has_no_candidates() {
        let input = b"abcdefgh";
        let history = History::new(input.len());
        assert_eq!(history.candidates(input, 4).count(), 0);
    }
}
