//! Engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, YeepError};

/// Default block size of a noise source, in samples.
pub const DEFAULT_NOISE_BUFFER_SIZE: usize = 4096;

/// Default cap on live nodes in a render context.
pub const DEFAULT_MAX_NODES: usize = 4096;

/// Settings shared by the effect library and the render context.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Render sample rate in Hz.
    pub sample_rate: f32,
    /// Block size requested from noise sources.
    pub noise_buffer_size: usize,
    /// Maximum live nodes before the host refuses allocations.
    pub max_nodes: usize,
    /// Emit an info event for every played effect.
    pub logging: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            noise_buffer_size: DEFAULT_NOISE_BUFFER_SIZE,
            max_nodes: DEFAULT_MAX_NODES,
            logging: true,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(YeepError::InvalidSampleRate(self.sample_rate));
        }
        if self.noise_buffer_size == 0 {
            return Err(YeepError::InvalidBufferSize(self.noise_buffer_size));
        }
        if self.max_nodes == 0 {
            return Err(YeepError::HostCapacity { limit: 0 });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let config = EngineConfig::default().with_sample_rate(0.0);
        assert_eq!(
            config.validate(),
            Err(YeepError::InvalidSampleRate(0.0))
        );
    }

    #[test]
    fn rejects_empty_noise_block() {
        let config = EngineConfig {
            noise_buffer_size: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
