//! Live configuration of the accelerator core.

use thiserror::Error;

use crate::constants::*;

#[allow(missing_docs)]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("num_filter_words {0} exceeds filter store capacity {}", FILTER_WORDS_PER_STORE)]
    FilterWordsOverflow(usize),

    #[error("output_channel_depth {0} exceeds parameter memory capacity {}", MAX_CHANNEL_DEPTH)]
    ChannelDepthOverflow(usize),

    #[error("output_channel_depth must be at least 1")]
    ZeroChannelDepth,

    #[error("input_offset {0} does not fit {} signed bits", OFFSET_WIDTH)]
    InputOffsetRange(i16),

    #[error("output_offset {0} does not fit {} signed bits", OFFSET_WIDTH)]
    OutputOffsetRange(i16),

    #[error("output activation range [{min}, {max}] is empty")]
    ActivationRange { min: i8, max: i8 },
}

/// Configuration signals, held stable for the duration of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreConfig {
    /// Number of words of filter data, per filter store.
    pub num_filter_words: usize,
    /// Number of output channels to cycle through.
    pub output_channel_depth: usize,
    /// Offset applied to each input activation value.
    pub input_offset: i16,
    /// Offset applied to each output value.
    pub output_offset: i16,
    /// The minimum output value.
    pub output_activation_min: i8,
    /// The maximum output value.
    pub output_activation_max: i8,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            num_filter_words: 0,
            output_channel_depth: 1,
            input_offset: 0,
            output_offset: 0,
            output_activation_min: i8::MIN,
            output_activation_max: i8::MAX,
        }
    }
}

impl CoreConfig {
    /// Checks the ranges the core assumes. The core itself never checks its configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let offset_range = -(1 << (OFFSET_WIDTH - 1))..(1 << (OFFSET_WIDTH - 1));

        if self.num_filter_words > FILTER_WORDS_PER_STORE {
            return Err(ConfigError::FilterWordsOverflow(self.num_filter_words));
        }
        if self.output_channel_depth > MAX_CHANNEL_DEPTH {
            return Err(ConfigError::ChannelDepthOverflow(self.output_channel_depth));
        }
        if self.output_channel_depth == 0 {
            return Err(ConfigError::ZeroChannelDepth);
        }
        if !offset_range.contains(&self.input_offset) {
            return Err(ConfigError::InputOffsetRange(self.input_offset));
        }
        if !offset_range.contains(&self.output_offset) {
            return Err(ConfigError::OutputOffsetRange(self.output_offset));
        }
        if self.output_activation_min > self.output_activation_max {
            return Err(ConfigError::ActivationRange {
                min: self.output_activation_min,
                max: self.output_activation_max,
            });
        }
        Ok(())
    }

    /// Returns the validated configuration.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }
}
