//! Band Plan and Gain Ranges
//!
//! Center frequencies are spaced logarithmically between 20 Hz and Nyquist
//! so every band covers the same musical interval.

use crate::error::DspError;

/// Lowest band center (Hz)
pub const MIN_BAND_FREQUENCY: f32 = 20.0;

/// Deepest cut in dB; matches the dynamic range of a Q15 coefficient
pub const MIN_GAIN_DB: f32 = -90.0;

/// Largest boost in dB; keeps boosted kernels away from destructive clipping
pub const MAX_GAIN_DB: f32 = 12.0;

/// Clamp a requested gain to `[MIN_GAIN_DB, MAX_GAIN_DB]`
#[inline]
pub fn clamp_gain_db(gain_db: f32) -> f32 {
    if gain_db.is_nan() {
        return 0.0;
    }
    gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
}

/// Map a normalized slider value to dB
///
/// `-1.0..0.0` maps linearly onto `-90..0` dB and `0.0..1.0` onto `0..+12` dB,
/// so the cut side reaches the full Q15 range while boosts stay moderate.
pub fn normalized_to_db(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    let value = value.clamp(-1.0, 1.0);
    if value < 0.0 {
        value * -MIN_GAIN_DB
    } else {
        value * MAX_GAIN_DB
    }
}

/// Inverse of [`normalized_to_db`]
pub fn db_to_normalized(gain_db: f32) -> f32 {
    let gain_db = clamp_gain_db(gain_db);
    if gain_db < 0.0 {
        gain_db / -MIN_GAIN_DB
    } else {
        gain_db / MAX_GAIN_DB
    }
}

/// Snapshot of one equalizer band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub index: usize,
    pub center_frequency_hz: f32,
    /// Gain the active kernel was designed with
    pub committed_gain_db: f32,
    /// Gain requested by the setters, applied on the next rebuild
    pub pending_gain_db: f32,
}

impl Band {
    /// Whether a rebuild is still needed for this band to take effect
    pub fn is_pending(&self) -> bool {
        self.committed_gain_db != self.pending_gain_db
    }
}

/// Logarithmically spaced band centers for a sample rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPlan<const BANDS: usize> {
    centers: [f32; BANDS],
    sample_rate: f32,
}

impl<const BANDS: usize> BandPlan<BANDS> {
    /// Compute `BANDS` centers between 20 Hz and `sample_rate / 2`
    pub fn logarithmic(sample_rate: f32) -> Result<Self, DspError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        if BANDS == 0 {
            return Err(DspError::InvalidBandCount);
        }

        let log_min = MIN_BAND_FREQUENCY.log10();
        let log_max = (sample_rate / 2.0).log10();

        let centers = if BANDS == 1 {
            [10.0_f32.powf((log_min + log_max) * 0.5); BANDS]
        } else {
            let step = (log_max - log_min) / (BANDS - 1) as f32;
            core::array::from_fn(|i| 10.0_f32.powf(log_min + step * i as f32))
        };

        Ok(Self {
            centers,
            sample_rate,
        })
    }

    /// Center frequency of `band`, or `None` if out of range
    pub fn frequency(&self, band: usize) -> Option<f32> {
        self.centers.get(band).copied()
    }

    pub fn frequencies(&self) -> &[f32; BANDS] {
        &self.centers
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate / 2.0
    }

    pub const fn len(&self) -> usize {
        BANDS
    }

    pub const fn is_empty(&self) -> bool {
        BANDS == 0
    }
}
