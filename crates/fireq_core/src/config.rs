//! Audio Format and Equalizer Configuration

use serde::{Deserialize, Serialize};

/// Most interleaved channels one equalizer will filter
pub const MAX_CHANNELS: u16 = 32;

/// Audio format descriptor supplied at `begin()` or on a format change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of interleaved channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Bits per PCM sample (16, 24 or 32)
    pub bits_per_sample: u16,
}

impl Default for AudioInfo {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            bits_per_sample: 16,
        }
    }
}

impl AudioInfo {
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Bytes in one interleaved frame
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * ((self.bits_per_sample as usize + 7) / 8)
    }

    /// Nyquist frequency in Hz
    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err(format!("Invalid sample rate: {}", self.sample_rate));
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(format!("Invalid channel count: {}", self.channels));
        }
        if !matches!(self.bits_per_sample, 16 | 24 | 32) {
            return Err(format!("Invalid bits per sample: {}", self.bits_per_sample));
        }
        Ok(())
    }
}

/// Equalizer behavior options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualizerConfig {
    /// Apply pending gain changes automatically before each processed block.
    /// Off by default so kernel rebuild latency stays under caller control.
    #[serde(default)]
    pub auto_update: bool,
}

impl EqualizerConfig {
    /// Config that rebuilds the kernel from the audio path when gains change
    pub fn auto_update() -> Self {
        Self { auto_update: true }
    }
}
