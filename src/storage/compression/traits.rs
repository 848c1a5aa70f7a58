//! Compression outcomes and statistics
//!
//! The compressor and decompressor report two very different kinds of failure:
//! a `Declined` compression is routine (the caller stores the value raw), while a
//! `CorruptStream` means stored data cannot be trusted.

use std::fmt;
use thiserror::Error;

/// Why the compressor chose not to compress an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    /// Input is shorter than the strategy's minimum
    InputTooSmall { len: usize, min: usize },

    /// Input is longer than the strategy's maximum or than a varlena can hold
    InputTooLarge { len: usize, max: usize },

    /// Nothing matched within the first `first_success_by` input bytes
    NoEarlyMatch { first_success_by: usize },

    /// Output reached the input size
    NoSizeReduction { input_len: usize, output_len: usize },

    /// Output exceeds what the required compression rate allows
    InsufficientRate { output_len: usize, limit: usize },
}

impl fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclineReason::InputTooSmall { len, min } => {
                write!(f, "input of {} bytes is below the minimum of {}", len, min)
            }
            DeclineReason::InputTooLarge { len, max } => {
                write!(f, "input of {} bytes is above the maximum of {}", len, max)
            }
            DeclineReason::NoEarlyMatch { first_success_by } => {
                write!(f, "no match within the first {} bytes", first_success_by)
            }
            DeclineReason::NoSizeReduction {
                input_len,
                output_len,
            } => write!(
                f,
                "output of {} bytes is not smaller than input of {} bytes",
                output_len, input_len
            ),
            DeclineReason::InsufficientRate { output_len, limit } => write!(
                f,
                "output of {} bytes exceeds the rate limit of {} bytes",
                output_len, limit
            ),
        }
    }
}

/// Compression was not applied; store the value uncompressed instead
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{reason}")]
pub struct Declined {
    pub reason: DeclineReason,
}

impl Declined {
    pub fn new(reason: DeclineReason) -> Self {
        Self { reason }
    }
}

/// The compressed stream is invalid or does not match the expected size
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at stream byte {position}")]
pub struct CorruptStream {
    /// Offset into the tag/literal stream where decoding stopped
    pub position: usize,
    pub message: String,
}

impl CorruptStream {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Helper trait for compression statistics
pub trait CompressionStats {
    /// Returns the uncompressed size
    fn uncompressed_size(&self) -> usize;

    /// Returns the compressed size
    fn compressed_size(&self) -> usize;

    /// Returns the compression ratio
    fn compression_ratio(&self) -> f64 {
        if self.compressed_size() > 0 {
            self.uncompressed_size() as f64 / self.compressed_size() as f64
        } else {
            1.0
        }
    }

    /// Returns the space savings as a percentage
    fn space_savings(&self) -> f64 {
        if self.uncompressed_size() > 0 {
            (1.0 - (self.compressed_size() as f64 / self.uncompressed_size() as f64)) * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStats {
        uncompressed: usize,
        compressed: usize,
    }

    impl CompressionStats for MockStats {
        fn uncompressed_size(&self) -> usize {
            self.uncompressed
        }

        fn compressed_size(&self) -> usize {
            self.compressed
        }
    }

    #[test]
    fn test_compression_ratio() {
        let stats = MockStats {
            uncompressed: 1000,
            compressed: 100,
        };
        assert_eq!(stats.compression_ratio(), 10.0);
    }

    #[test]
    fn test_space_savings() {
        let stats = MockStats {
            uncompressed: 1000,
            compressed: 250,
        };
        assert_eq!(stats.space_savings(), 75.0);

        let empty = MockStats {
            uncompressed: 0,
            compressed: 0,
        };
        assert_eq!(empty.space_savings(), 0.0);
        assert_eq!(empty.compression_ratio(), 1.0);
    }

    #[test]
    fn test_decline_display() {
        let declined = Declined::new(DeclineReason::InputTooSmall { len: 10, min: 32 });
        assert_eq!(
            format!("{}", declined),
            "input of 10 bytes is below the minimum of 32"
        );

        let declined = Declined::new(DeclineReason::NoEarlyMatch {
            first_success_by: 1024,
        });
        assert_eq!(format!("{}", declined), "no match within the first 1024 bytes");
    }

    #[test]
    fn test_corrupt_display() {
        let err = CorruptStream::new(3, "match offset 9 exceeds 2 decoded bytes");
        assert_eq!(
            format!("{}", err),
            "match offset 9 exceeds 2 decoded bytes at stream byte 3"
        );
    }
}
