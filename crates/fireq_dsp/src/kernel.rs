//! Q15 FIR Kernel

use std::f32::consts::PI;

use crate::sample::Q15_SCALE;

/// Fixed-length FIR kernel of Q15 coefficients
///
/// The length is part of the type, so a kernel can never change size
/// across rebuilds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel<const TAPS: usize> {
    taps: [i16; TAPS],
}

impl<const TAPS: usize> Kernel<TAPS> {
    /// Index of the center tap, `(TAPS - 1) / 2`
    pub const CENTER: usize = TAPS.saturating_sub(1) / 2;

    /// Pass-through filter: unity at the center tap, zero elsewhere
    pub fn identity() -> Self {
        let mut taps = [0i16; TAPS];
        if TAPS > 0 {
            taps[Self::CENTER] = Q15_SCALE as i16;
        }
        Self { taps }
    }

    /// Kernel with every coefficient set to `value`
    pub fn filled(value: i16) -> Self {
        Self {
            taps: [value; TAPS],
        }
    }

    pub fn from_taps(taps: [i16; TAPS]) -> Self {
        Self { taps }
    }

    pub fn taps(&self) -> &[i16; TAPS] {
        &self.taps
    }

    pub fn taps_mut(&mut self) -> &mut [i16; TAPS] {
        &mut self.taps
    }

    #[inline]
    pub fn tap(&self, n: usize) -> i16 {
        self.taps[n]
    }

    pub const fn len(&self) -> usize {
        TAPS
    }

    pub const fn is_empty(&self) -> bool {
        TAPS == 0
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Sum of squared coefficients
    pub fn energy(&self) -> i64 {
        self.taps.iter().map(|&c| c as i64 * c as i64).sum()
    }

    /// Magnitude response at `freq_hz`, with full-scale Q15 as 1.0
    pub fn magnitude_at(&self, freq_hz: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * freq_hz / sample_rate;
        let (re, im) = self
            .taps
            .iter()
            .enumerate()
            .fold((0.0_f32, 0.0_f32), |(re, im), (n, &c)| {
                let c = c as f32 / Q15_SCALE;
                let phase = w * n as f32;
                (re + c * phase.cos(), im - c * phase.sin())
            });
        (re * re + im * im).sqrt()
    }
}

impl<const TAPS: usize> Default for Kernel<TAPS> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<const TAPS: usize> AsRef<[i16]> for Kernel<TAPS> {
    fn as_ref(&self) -> &[i16] {
        &self.taps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_center_tap() {
        let k = Kernel::<128>::identity();
        assert_eq!(Kernel::<128>::CENTER, 63);
        assert_eq!(k.tap(63), 32767);
        assert_eq!(k.taps().iter().filter(|&&c| c != 0).count(), 1);

        let k = Kernel::<127>::identity();
        assert_eq!(k.tap(63), 32767);
    }

    #[test]
    fn test_identity_is_flat() {
        let k = Kernel::<64>::identity();
        for freq in [20.0, 1000.0, 10000.0, 22000.0] {
            let mag = k.magnitude_at(freq, 44100.0);
            assert!((mag - 1.0).abs() < 1e-4, "{freq} Hz -> {mag}");
        }
    }

    #[test]
    fn test_energy() {
        let k = Kernel::<4>::from_taps([1, -2, 3, 0]);
        assert_eq!(k.energy(), 14);
        assert_eq!(Kernel::<8>::identity().energy(), 32767 * 32767);
    }

    #[test]
    fn test_default_is_identity() {
        assert!(Kernel::<33>::default().is_identity());
        assert!(!Kernel::<33>::filled(7).is_identity());
    }
}
