//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while planning bands or designing kernels
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Invalid band index: {index} (must be 0-{})", .bands.saturating_sub(1))]
    InvalidBandIndex { index: usize, bands: usize },

    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("FIR kernel needs at least 2 taps, got {0}")]
    InvalidTapCount(usize),

    #[error("Equalizer needs at least one band")]
    InvalidBandCount,
}
