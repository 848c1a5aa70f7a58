//! LZ compressor
//!
//! Greedy LZ77 over the complete input history. Every position is looked up in the
//! history table; the chain is walked newest first while the "good match" threshold
//! shrinks after each probe, so a position costs a bounded number of comparisons
//! even though matches may reach back to the very first byte.
//!
//! The compressor is allowed to give up at several points, because storing a value
//! raw is always a valid fallback:
//!
//! 1. the input size is outside the strategy's range,
//! 2. no match turned up within the first `first_success_by` bytes,
//! 3. the output is not smaller than the input,
//! 4. the output is larger than the strategy's compression rate allows.

use crate::common::constants::{COMPRESS_OVERRUN_SLACK, VARHDRSZ_COMPRESSED, VARLENA_MAX_LEN};
use crate::storage::compression::lz::format::{TagWriter, MAX_MATCH, MIN_MATCH};
use crate::storage::compression::lz::history::History;
use crate::storage::compression::strategy::CompressionStrategy;
use crate::storage::compression::traits::{CompressionStats, DeclineReason, Declined};
use crate::storage::compression::types::{max_output_len, CompressedBlock};
use tracing::{debug, trace};

/// Largest input the compressor accepts: its output must still fit a 4-byte header
const MAX_COMPRESS_INPUT: usize = VARLENA_MAX_LEN as usize - VARHDRSZ_COMPRESSED;

/// Compresses `raw` according to `strategy`
pub fn compress(raw: &[u8], strategy: &CompressionStrategy) -> Result<CompressedBlock, Declined> {
    let result = compress_stream(raw, strategy);
    match &result {
        Ok(block) => trace!(
            raw_len = raw.len(),
            compressed_len = block.data().len(),
            ratio = block.compression_ratio(),
            "compressed value"
        ),
        Err(declined) => debug!(
            raw_len = raw.len(),
            reason = %declined.reason,
            "compression declined"
        ),
    }
    result
}

/// Compresses `raw` into `dst` as a complete `Compressed4` varlena
///
/// Returns the number of bytes written.
///
/// # Panics
/// If `dst` is shorter than [`max_output_len`]`(raw.len())`.
pub fn compress_into(
    raw: &[u8],
    strategy: &CompressionStrategy,
    dst: &mut [u8],
) -> Result<usize, Declined> {
    let required = max_output_len(raw.len());
    assert!(
        dst.len() >= required,
        "compression output buffer of {} bytes is below the required {}",
        dst.len(),
        required
    );
    let block = compress(raw, strategy)?;
    Ok(block.write_varlena(dst))
}

fn compress_stream(
    raw: &[u8],
    strategy: &CompressionStrategy,
) -> Result<CompressedBlock, Declined> {
    let len = raw.len();

    if len < strategy.min_input_size as usize {
        return decline(DeclineReason::InputTooSmall {
            len,
            min: strategy.min_input_size as usize,
        });
    }
    let max = (strategy.max_input_size as usize).min(MAX_COMPRESS_INPUT);
    if len > max {
        return decline(DeclineReason::InputTooLarge { len, max });
    }

    let result_max = strategy.result_limit(len);
    let first_success_by = strategy.first_success_by as usize;

    let mut history = History::new(len);
    let mut writer = TagWriter::with_capacity(len + COMPRESS_OVERRUN_SLACK);
    let mut found_match = false;
    let mut pos = 0;

    while pos < len {
        // Output only grows, so once either limit is crossed there is no way back
        let written = writer.len();
        if written >= len {
            return decline(DeclineReason::NoSizeReduction {
                input_len: len,
                output_len: written,
            });
        }
        if written > result_max {
            return decline(DeclineReason::InsufficientRate {
                output_len: written,
                limit: result_max,
            });
        }
        if !found_match && pos >= first_success_by {
            return decline(DeclineReason::NoEarlyMatch { first_success_by });
        }

        match find_match(raw, pos, &history, strategy) {
            Some((offset, match_len)) => {
                writer.push_match(offset, match_len);
                for p in pos..pos + match_len {
                    history.insert(raw, p);
                }
                pos += match_len;
                found_match = true;
            }
            None => {
                writer.push_literal(raw[pos]);
                history.insert(raw, pos);
                pos += 1;
            }
        }
    }

    let output_len = writer.len();
    if output_len >= len {
        return decline(DeclineReason::NoSizeReduction {
            input_len: len,
            output_len,
        });
    }
    if output_len > result_max {
        return decline(DeclineReason::InsufficientRate {
            output_len,
            limit: result_max,
        });
    }

    Ok(CompressedBlock::new(len as u32, writer.finish()))
}

fn decline<T>(reason: DeclineReason) -> Result<T, Declined> {
    Err(Declined::new(reason))
}

/// Finds a match for the bytes at `pos`, returns `(offset, length)`
///
/// Candidates are probed newest first. The walk stops as soon as a candidate
/// reaches the current good-match length, which drops by `match_size_drop` percent
/// (at least one byte) after every probe that falls short. The longest match seen
/// wins; it is only used if it reaches `MIN_MATCH`.
fn find_match(
    input: &[u8],
    pos: usize,
    history: &History,
    strategy: &CompressionStrategy,
) -> Option<(usize, usize)> {
    let max_len = MAX_MATCH.min(input.len() - pos);
    if max_len < MIN_MATCH {
        return None;
    }

    let drop = strategy.match_size_drop.min(100) as usize;
    let mut good_match = strategy.match_size_good as usize;
    let mut best_len = 0;
    let mut best_offset = 0;

    for candidate in history.candidates(input, pos) {
        let len = match_length(input, candidate, pos, max_len);
        if len > best_len {
            best_len = len;
            best_offset = pos - candidate;
        }
        if len >= good_match || best_len == max_len {
            break;
        }
        if drop > 0 {
            let step = (good_match * drop / 100).max(1);
            good_match = good_match.saturating_sub(step);
        }
    }

    if best_len >= MIN_MATCH {
        Some((best_offset, best_len))
    } else {
        None
    }
}

/// Length of the common run at `candidate` and `pos`, capped at `max_len`
///
/// The run may overlap `pos` itself; the decoder copies byte by byte, so an
/// overlapping match reproduces a repeating pattern.
#[inline]
fn match_length(input: &[u8], candidate: usize, pos: usize, max_len: usize) -> usize {
    let mut len = 0;
    while len < max_len && input[candidate + len] == input[pos + len] {
        len += 1;
    }
    len
}
