//! Blackman Window Table
//!
//! Pre-computed once per configuration so kernel design only does a
//! lookup per tap.

use std::f32::consts::PI;

use crate::error::DspError;

/// Blackman window value for tap `n` of `size`
fn blackman(n: usize, size: usize) -> f32 {
    let span = (size - 1) as f32;
    let x = n as f32 / span;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

/// Pre-computed Blackman window lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct Window<const TAPS: usize> {
    coeffs: [f32; TAPS],
}

impl<const TAPS: usize> Window<TAPS> {
    /// Build the table; a window needs at least two taps
    pub fn blackman() -> Result<Self, DspError> {
        if TAPS < 2 {
            return Err(DspError::InvalidTapCount(TAPS));
        }
        let coeffs = core::array::from_fn(|n| blackman(n, TAPS));
        Ok(Self { coeffs })
    }

    #[inline]
    pub fn coefficient(&self, n: usize) -> f32 {
        self.coeffs[n]
    }

    pub fn coefficients(&self) -> &[f32; TAPS] {
        &self.coeffs
    }
}
