//! fireq DSP - Digital Signal Processing Module
//!
//! This crate provides the numeric core of the fireq N-band equalizer:
//! - Logarithmic band plan between 20 Hz and Nyquist
//! - Blackman window table
//! - Windowed-sinc master kernel design, quantized to Q15
//! - Double-buffered kernel store with torn-read-free swaps
//! - Per-channel fixed-point FIR convolution with saturation
//!
//! # Architecture
//!
//! The audio path never designs kernels and never waits on a design.
//! Designs are computed in float on the control side, copied into the
//! staging buffer and published with a single atomic index store.

mod band;
mod convolver;
mod design;
mod error;
mod kernel;
mod processor;
mod sample;
mod store;
mod window;

pub use band::{
    clamp_gain_db, db_to_normalized, normalized_to_db, Band, BandPlan, MAX_GAIN_DB,
    MIN_BAND_FREQUENCY, MIN_GAIN_DB,
};
pub use convolver::FirConvolver;
pub use design::{KernelDesigner, GAIN_EPSILON_DB};
pub use error::DspError;
pub use kernel::Kernel;
pub use processor::{AudioProcessor, BYTE_BLOCK_SAMPLES};
pub use sample::{Sample, I24, Q15_SCALE, Q15_SHIFT};
pub use store::{KernelGuard, KernelStore};
pub use window::Window;
