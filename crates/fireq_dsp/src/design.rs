//! Master Kernel Designer
//!
//! Synthesizes one FIR kernel from independent per-band gains.
//!
//! # Algorithm
//!
//! Start from a unit impulse at the center tap (flat response). For every
//! band with a non-negligible gain, build a Blackman-windowed band-pass
//! (high-edge low-pass minus low-edge low-pass), normalize it to unity gain
//! at the band center, scale it by `10^(dB/20) - 1` and add it to the
//! impulse. Bands superpose linearly; only the final write is quantized to
//! Q15, saturating rather than wrapping.
//!
//! All of this is float work done outside any lock. The result is written
//! into a staging [`Kernel`], never the one the audio path is reading.

use std::f32::consts::PI;

use tracing::debug;

use crate::band::{clamp_gain_db, BandPlan};
use crate::error::DspError;
use crate::kernel::Kernel;
use crate::sample::Q15_SCALE;
use crate::window::Window;

/// Bands with less than this much gain (either direction) are skipped
pub const GAIN_EPSILON_DB: f32 = 0.1;

/// Lower band edge relative to the center (-3 dB point)
const LOWER_EDGE: f32 = 0.707;

/// Upper band edge relative to the center (-3 dB point)
const UPPER_EDGE: f32 = 1.414;

/// Blackman main-lobe width in bins; narrower bands are widened to this
const MIN_BANDWIDTH_BINS: f32 = 4.0;

/// Lowest allowed lower edge after widening (Hz)
const MIN_LOWER_EDGE_HZ: f32 = 1.0;

#[inline]
fn sinc(x: f32) -> f32 {
    if x.abs() < 1e-8 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Normalized `(f_low, f_high)` edges of a band's pass-band, or `None`
/// when the band degenerates and must be skipped
fn band_edges(center_hz: f32, sample_rate: f32, taps: usize) -> Option<(f32, f32)> {
    let mut low_hz = center_hz * LOWER_EDGE;
    let mut high_hz = center_hz * UPPER_EDGE;

    // A T-tap window cannot resolve anything narrower than its main lobe
    let min_bw_hz = MIN_BANDWIDTH_BINS * sample_rate / taps as f32;
    let bw_hz = high_hz - low_hz;
    if bw_hz < min_bw_hz {
        let expand = (min_bw_hz - bw_hz) * 0.5;
        low_hz -= expand;
        high_hz += expand;
        if low_hz < MIN_LOWER_EDGE_HZ {
            low_hz = MIN_LOWER_EDGE_HZ;
        }
    }

    let low = (low_hz / sample_rate).clamp(0.0, 0.5);
    let high = (high_hz / sample_rate).clamp(0.0, 0.5);
    if high <= low {
        return None;
    }
    Some((low, high))
}

/// Designs master kernels for a fixed band plan and window
#[derive(Debug, Clone)]
pub struct KernelDesigner<const TAPS: usize, const BANDS: usize> {
    plan: BandPlan<BANDS>,
    window: Window<TAPS>,
    /// Gains (dB) the last design used
    committed: [f32; BANDS],
    /// Float accumulation buffer, reused between designs
    scratch: [f32; TAPS],
}

impl<const TAPS: usize, const BANDS: usize> KernelDesigner<TAPS, BANDS> {
    /// Create a designer for `sample_rate` with every band at 0 dB
    pub fn new(sample_rate: f32) -> Result<Self, DspError> {
        let plan = BandPlan::logarithmic(sample_rate)?;
        let window = Window::blackman()?;
        Ok(Self::with_plan(plan, window))
    }

    pub fn with_plan(plan: BandPlan<BANDS>, window: Window<TAPS>) -> Self {
        Self {
            plan,
            window,
            committed: [0.0; BANDS],
            scratch: [0.0; TAPS],
        }
    }

    pub fn plan(&self) -> &BandPlan<BANDS> {
        &self.plan
    }

    pub fn window(&self) -> &Window<TAPS> {
        &self.window
    }

    pub fn sample_rate(&self) -> f32 {
        self.plan.sample_rate()
    }

    /// Gains the most recent design was built from
    pub fn committed_gains(&self) -> &[f32; BANDS] {
        &self.committed
    }

    /// Commit new gains (clamped) for the next design
    pub fn commit_gains(&mut self, gains_db: &[f32; BANDS]) {
        for (committed, &gain) in self.committed.iter_mut().zip(gains_db) {
            *committed = clamp_gain_db(gain);
        }
    }

    /// Float kernel for the committed gains
    ///
    /// Runs in O(TAPS x BANDS); call it outside any critical section.
    pub fn design(&mut self) -> &[f32; TAPS] {
        let sample_rate = self.plan.sample_rate();
        let m = Kernel::<TAPS>::CENTER;

        self.scratch = [0.0; TAPS];
        self.scratch[m] = 1.0;

        for (band, &gain_db) in self.committed.iter().enumerate() {
            if gain_db.abs() < GAIN_EPSILON_DB {
                continue;
            }

            let center_hz = self.plan.frequencies()[band];
            let Some((f_low, f_high)) = band_edges(center_hz, sample_rate, TAPS) else {
                debug!("Band {} ({:.1} Hz) has no usable pass-band, skipped", band, center_hz);
                continue;
            };

            // Add (gain - 1) of the band so 0 dB leaves the impulse untouched
            let lin_delta = 10.0_f32.powf(gain_db / 20.0) - 1.0;

            let band_pass = |n: usize| {
                let offset = n as f32 - m as f32;
                let bp = 2.0 * f_high * sinc(2.0 * f_high * offset)
                    - 2.0 * f_low * sinc(2.0 * f_low * offset);
                bp * self.window.coefficient(n)
            };

            // Window attenuates the pass-band peak; measure it at the center
            // so the requested boost/cut is met exactly there
            let w_center = 2.0 * PI * center_hz / sample_rate;
            let (re, im) = (0..TAPS).fold((0.0_f32, 0.0_f32), |(re, im), n| {
                let bp = band_pass(n);
                let phase = w_center * n as f32;
                (re + bp * phase.cos(), im - bp * phase.sin())
            });
            let bp_mag = (re * re + im * im).sqrt();
            let norm = if bp_mag > 1e-6 { 1.0 / bp_mag } else { 1.0 };

            for n in 0..TAPS {
                self.scratch[n] += band_pass(n) * norm * lin_delta;
            }
        }

        &self.scratch
    }

    /// Quantize the last design into `kernel`, saturating to Q15
    pub fn quantize_into(&self, kernel: &mut Kernel<TAPS>) {
        for (dst, &x) in kernel.taps_mut().iter_mut().zip(&self.scratch) {
            let q = (x * Q15_SCALE).round();
            *dst = q.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        }
    }

    /// Design for the committed gains and write the result into `kernel`
    pub fn design_into(&mut self, kernel: &mut Kernel<TAPS>) {
        self.design();
        self.quantize_into(kernel);
    }
}
