//! PCM Sample Types
//!
//! The convolver is generic over the sample format. Each format names the
//! accumulator it convolves in, how a Q15 accumulator is scaled back down,
//! and how the sample is laid out in an interleaved little-endian byte
//! stream.

use std::fmt::Debug;
use std::ops::Add;

/// Q15 scale used when quantizing coefficients (+1.0 maps to 32767)
pub const Q15_SCALE: f32 = 32767.0;

/// Q15 descale shift applied to integer accumulators
pub const Q15_SHIFT: u32 = 15;

/// A PCM sample type that can run through the Q15 FIR convolver
///
/// # Real-time Safety
/// All methods are branch-light and allocation-free; they run once per tap
/// or once per sample on the audio thread.
pub trait Sample: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Accumulator wide enough to sum `TAPS` products without overflow
    type Acc: Copy + Add<Output = Self::Acc>;

    /// Accumulator zero
    const ZERO: Self::Acc;

    /// Bytes per sample in the interleaved stream
    const BYTES: usize;

    /// Bits per sample as reported by the audio format descriptor
    const BITS: u16;

    /// `sample * coefficient` in the accumulator domain
    fn mul_q15(self, coefficient: i16) -> Self::Acc;

    /// Descale a Q15 accumulator and saturate to the sample range
    fn from_q15(acc: Self::Acc) -> Self;

    /// Decode one sample from exactly `Self::BYTES` little-endian bytes
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode one sample into exactly `Self::BYTES` little-endian bytes
    fn write_le(self, bytes: &mut [u8]);
}

#[inline]
fn saturate(acc: i64, lo: i64, hi: i64) -> i64 {
    (acc >> Q15_SHIFT).clamp(lo, hi)
}

impl Sample for i16 {
    type Acc = i64;
    const ZERO: i64 = 0;
    const BYTES: usize = 2;
    const BITS: u16 = 16;

    #[inline]
    fn mul_q15(self, coefficient: i16) -> i64 {
        self as i64 * coefficient as i64
    }

    #[inline]
    fn from_q15(acc: i64) -> Self {
        saturate(acc, i16::MIN as i64, i16::MAX as i64) as i16
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }

    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes[..2].copy_from_slice(&self.to_le_bytes());
    }
}

impl Sample for i32 {
    type Acc = i64;
    const ZERO: i64 = 0;
    const BYTES: usize = 4;
    const BITS: u16 = 32;

    #[inline]
    fn mul_q15(self, coefficient: i16) -> i64 {
        self as i64 * coefficient as i64
    }

    #[inline]
    fn from_q15(acc: i64) -> Self {
        saturate(acc, i32::MIN as i64, i32::MAX as i64) as i32
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes[..4].copy_from_slice(&self.to_le_bytes());
    }
}

/// Packed 24-bit signed PCM sample, held sign-extended in an `i32`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct I24(i32);

impl I24 {
    pub const MIN: i32 = -(1 << 23);
    pub const MAX: i32 = (1 << 23) - 1;

    /// Create a 24-bit sample, saturating values outside the 24-bit range
    pub fn new(value: i32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl From<I24> for i32 {
    fn from(sample: I24) -> Self {
        sample.0
    }
}

impl Sample for I24 {
    type Acc = i64;
    const ZERO: i64 = 0;
    const BYTES: usize = 3;
    const BITS: u16 = 24;

    #[inline]
    fn mul_q15(self, coefficient: i16) -> i64 {
        self.0 as i64 * coefficient as i64
    }

    #[inline]
    fn from_q15(acc: i64) -> Self {
        Self(saturate(acc, Self::MIN as i64, Self::MAX as i64) as i32)
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        // Place the three bytes in the top of an i32 and shift back to sign-extend
        let raw = i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]);
        Self(raw >> 8)
    }

    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        let le = self.0.to_le_bytes();
        bytes[..3].copy_from_slice(&le[..3]);
    }
}

impl Sample for f32 {
    type Acc = f32;
    const ZERO: f32 = 0.0;
    const BYTES: usize = 4;
    const BITS: u16 = 32;

    #[inline]
    fn mul_q15(self, coefficient: i16) -> f32 {
        self * coefficient as f32
    }

    /// Float samples are not saturated; the caller owns headroom
    #[inline]
    fn from_q15(acc: f32) -> Self {
        acc / (1u32 << Q15_SHIFT) as f32
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes[..4].copy_from_slice(&self.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i16_descale_saturates() {
        // 32767 * 32767 >> 15 = 32766
        assert_eq!(i16::from_q15(32767i16.mul_q15(32767)), 32766);
        // Accumulating many full-scale products must clip, not wrap
        let acc = (0..8).fold(i16::ZERO, |acc, _| acc + 32767i16.mul_q15(32767));
        assert_eq!(i16::from_q15(acc), i16::MAX);
        let acc = (0..8).fold(i16::ZERO, |acc, _| acc + (-32768i16).mul_q15(32767));
        assert_eq!(i16::from_q15(acc), i16::MIN);
    }

    #[test]
    fn test_i32_exact_unit_coefficient() {
        // 1 << 15 is exactly unity once descaled
        let acc = 1_000_000i32 as i64 * (1 << 15);
        assert_eq!(i32::from_q15(acc), 1_000_000);
    }

    #[test]
    fn test_i24_sign_extension() {
        let mut bytes = [0u8; 3];
        I24::new(-2).write_le(&mut bytes);
        assert_eq!(bytes, [0xFE, 0xFF, 0xFF]);
        assert_eq!(I24::read_le(&bytes).get(), -2);

        I24::new(I24::MAX).write_le(&mut bytes);
        assert_eq!(I24::read_le(&bytes).get(), I24::MAX);
    }

    #[test]
    fn test_i24_saturates() {
        assert_eq!(I24::new(1 << 24).get(), I24::MAX);
        assert_eq!(I24::new(-(1 << 24)).get(), I24::MIN);
        let acc = (I24::MAX as i64) * 32767 * 4;
        assert_eq!(I24::from_q15(acc).get(), I24::MAX);
    }

    #[test]
    fn test_f32_descale() {
        let acc = 0.5f32.mul_q15(16384);
        assert!((f32::from_q15(acc) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_byte_codec_i16() {
        let mut bytes = [0u8; 2];
        (-1234i16).write_le(&mut bytes);
        assert_eq!(i16::read_le(&bytes), -1234);
    }
}
