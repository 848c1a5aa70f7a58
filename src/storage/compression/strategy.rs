//! Compression strategies
//!
//! A strategy is a plain, immutable parameter set that steers the LZ compressor:
//! which inputs are worth trying at all, how much shrinkage is required, how long
//! to keep scanning without a match, and how deep to walk the history per position.
//!
//! Two presets exist:
//!
//! - `CompressionStrategy::DEFAULT`: recommended for values stored in pages. Skips
//!   tiny inputs and gives up early on data that does not look compressible.
//! - `CompressionStrategy::ALWAYS`: tries any input and only declines when the
//!   output would not be smaller than the input.

use crate::common::error::VarlenaResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid strategy parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("min_comp_rate must be between 0 and 99, got {0}")]
    CompressionRate(u8),

    #[error("match_size_drop must be between 0 and 100, got {0}")]
    MatchSizeDrop(u8),

    #[error("min_input_size {min} is larger than max_input_size {max}")]
    InputRange { min: u32, max: u32 },
}

/// Parameters that control the compression heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompressionStrategy {
    /// Inputs shorter than this are never compressed
    pub min_input_size: u32,

    /// Inputs longer than this are never compressed
    pub max_input_size: u32,

    /// Required shrinkage in percent (0-99). The output must also always be
    /// smaller than the input, regardless of this value.
    pub min_comp_rate: u8,

    /// Give up if no match was found within this many input bytes
    pub first_success_by: u32,

    /// Initial "good enough" match length when walking the history. A good match
    /// found fast beats the best match found late.
    pub match_size_good: u32,

    /// Percentage by which the good match length is lowered after each history
    /// probe. 0 keeps it until the end of the chain, 100 only checks the latest
    /// history entry.
    pub match_size_drop: u8,
}

impl CompressionStrategy {
    /// Recommended strategy for values stored in pages
    pub const DEFAULT: CompressionStrategy = CompressionStrategy {
        min_input_size: 32,
        max_input_size: i32::MAX as u32,
        min_comp_rate: 25,
        first_success_by: 1024,
        match_size_good: 128,
        match_size_drop: 10,
    };

    /// Try to compress inputs of any length
    pub const ALWAYS: CompressionStrategy = CompressionStrategy {
        min_input_size: 0,
        max_input_size: i32::MAX as u32,
        min_comp_rate: 0,
        first_success_by: i32::MAX as u32,
        match_size_good: 128,
        match_size_drop: 6,
    };

    /// Checks that every parameter is within its documented range
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.min_comp_rate > 99 {
            return Err(StrategyError::CompressionRate(self.min_comp_rate));
        }
        if self.match_size_drop > 100 {
            return Err(StrategyError::MatchSizeDrop(self.match_size_drop));
        }
        if self.min_input_size > self.max_input_size {
            return Err(StrategyError::InputRange {
                min: self.min_input_size,
                max: self.max_input_size,
            });
        }
        Ok(())
    }

    /// Parses a strategy from JSON, either a preset name or explicit parameters
    ///
    /// ```ignore
    /// let always = CompressionStrategy::from_json(r#""always""#)?;
    /// let custom = CompressionStrategy::from_json(r#"{"min_input_size": 64, ...}"#)?;
    /// ```
    pub fn from_json(json: &str) -> VarlenaResult<Self> {
        let config: StrategyConfig = serde_json::from_str(json)?;
        Ok(config.resolve()?)
    }

    /// Largest output a successful compression of `input_len` bytes may produce
    pub(crate) fn result_limit(&self, input_len: usize) -> usize {
        let need_rate = self.min_comp_rate.min(99) as usize;
        crate::common::helper::percent_of(input_len, 100 - need_rate)
    }
}

impl Default for CompressionStrategy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Named strategy presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPreset {
    Default,
    Always,
}

impl StrategyPreset {
    /// Returns the strategy this preset names
    pub fn strategy(&self) -> CompressionStrategy {
        match self {
            StrategyPreset::Default => CompressionStrategy::DEFAULT,
            StrategyPreset::Always => CompressionStrategy::ALWAYS,
        }
    }
}

/// Strategy as it appears in configuration: a preset name or a full parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrategyConfig {
    Preset(StrategyPreset),
    Custom(CompressionStrategy),
}

impl StrategyConfig {
    /// Resolves the configured strategy and validates it
    pub fn resolve(&self) -> Result<CompressionStrategy, StrategyError> {
        let strategy = match self {
            StrategyConfig::Preset(preset) => preset.strategy(),
            StrategyConfig::Custom(strategy) => *strategy,
        };
        strategy.validate()?;
        Ok(strategy)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::Preset(StrategyPreset::Default)
    }
}
