//! N-Band FIR Equalizer
//!
//! Owns one convolver per channel and the control handle. Lives on the
//! audio thread; hand [`EqualizerHandle`] clones to control threads.

use std::sync::Arc;

use fireq_dsp::{AudioProcessor, Band, FirConvolver, Kernel, Sample};
use tracing::{debug, info, warn};

use crate::config::{AudioInfo, EqualizerConfig};
use crate::control::EqualizerHandle;
use crate::error::{EqError, EqResult};

/// Graphic equalizer with `BANDS` log-spaced bands and a `TAPS`-tap master kernel
///
/// # Example
///
/// ```
/// use fireq_core::{AudioInfo, NBandEqualizer};
///
/// let mut eq: NBandEqualizer = NBandEqualizer::new();
/// eq.begin(AudioInfo::new(44100, 2, 16)).unwrap();
/// eq.set_band_gain_db(0, 6.0).unwrap();
/// eq.update().unwrap();
///
/// let mut buffer = vec![1000i16, -1000, 500, -500];
/// eq.process_interleaved(&mut buffer);
/// ```
pub struct NBandEqualizer<S: Sample = i16, const TAPS: usize = 128, const BANDS: usize = 12> {
    handle: EqualizerHandle<TAPS, BANDS>,
    channels: Vec<FirConvolver<S, TAPS>>,
    info: Option<AudioInfo>,
    config: EqualizerConfig,
}

impl<S: Sample, const TAPS: usize, const BANDS: usize> NBandEqualizer<S, TAPS, BANDS> {
    /// Create an unconfigured equalizer with every band at 0 dB
    pub fn new() -> Self {
        Self::with_config(EqualizerConfig::default())
    }

    pub fn with_config(config: EqualizerConfig) -> Self {
        Self {
            handle: EqualizerHandle::new(),
            channels: Vec::new(),
            info: None,
            config,
        }
    }

    /// Configure for an audio format and build the initial kernel
    ///
    /// Computes the band plan and window, resets both kernels, allocates one
    /// convolver per channel and runs a forced rebuild. On error the
    /// previous configuration (if any) stays in place.
    pub fn begin(&mut self, info: AudioInfo) -> EqResult<()> {
        if let Err(e) = info.validate() {
            warn!("Rejected audio format {:?}: {}", info, e);
            return Err(EqError::ConfigError(e));
        }
        if info.bits_per_sample != S::BITS {
            warn!(
                "Rejected audio format: {} bits per sample, expected {}",
                info.bits_per_sample,
                S::BITS
            );
            return Err(EqError::UnsupportedSampleFormat {
                bits: info.bits_per_sample,
                expected: S::BITS,
            });
        }

        self.handle.configure(info.sample_rate as f32)?;

        let store = self.handle.store();
        self.channels = (0..info.channels)
            .map(|_| FirConvolver::with_store(Arc::clone(store)))
            .collect();
        self.info = Some(info);

        info!(
            "Equalizer started: {} Hz, {} channels, {} bands / {} taps",
            info.sample_rate, info.channels, BANDS, TAPS
        );
        self.handle.log_bands();
        Ok(())
    }

    /// Format-change notification; reconfigures with the new format
    pub fn set_audio_info(&mut self, info: AudioInfo) -> EqResult<()> {
        if self.info == Some(info) {
            return Ok(());
        }
        self.begin(info)
    }

    /// Release per-channel state; `begin()` is required again afterwards
    pub fn end(&mut self) {
        self.channels.clear();
        self.handle.deconfigure();
        self.info = None;
        info!("Equalizer stopped");
    }

    /// Thread-safe handle for changing gains from another thread
    pub fn handle(&self) -> EqualizerHandle<TAPS, BANDS> {
        self.handle.clone()
    }

    pub fn audio_info(&self) -> Option<AudioInfo> {
        self.info
    }

    pub fn config(&self) -> &EqualizerConfig {
        &self.config
    }

    /// Rebuild pending gain changes automatically before each block
    pub fn set_auto_update(&mut self, enabled: bool) {
        self.config.auto_update = enabled;
    }

    pub fn auto_update(&self) -> bool {
        self.config.auto_update
    }

    pub fn set_band_gain_db(&self, band: usize, gain_db: f32) -> EqResult<()> {
        self.handle.set_band_gain_db(band, gain_db)
    }

    pub fn set_band_gain_normalized(&self, band: usize, value: f32) -> EqResult<()> {
        self.handle.set_band_gain_normalized(band, value)
    }

    pub fn set_all_band_gains_normalized(&self, value: f32) {
        self.handle.set_all_band_gains_normalized(value);
    }

    pub fn set_band_gains_db(&self, gains_db: &[f32; BANDS]) {
        self.handle.set_band_gains_db(gains_db);
    }

    pub fn band_gain_db(&self, band: usize) -> f32 {
        self.handle.band_gain_db(band)
    }

    pub fn band_gain_normalized(&self, band: usize) -> f32 {
        self.handle.band_gain_normalized(band)
    }

    pub fn band_frequency_hz(&self, band: usize) -> f32 {
        self.handle.band_frequency_hz(band)
    }

    pub fn band(&self, band: usize) -> Option<Band> {
        self.handle.band(band)
    }

    pub fn bands(&self) -> Vec<Band> {
        self.handle.bands()
    }

    pub const fn band_count(&self) -> usize {
        BANDS
    }

    /// Rebuild the kernel now; `Ok(false)` if a rebuild was already running
    pub fn update(&self) -> EqResult<bool> {
        self.handle.update()
    }

    pub fn update_if_needed(&self) -> EqResult<bool> {
        self.handle.update_if_needed()
    }

    /// Copy of the kernel currently applied to audio
    pub fn active_kernel(&self) -> Kernel<TAPS> {
        self.handle.active_kernel()
    }

    /// Process an interleaved buffer in place
    ///
    /// Buffer format: [C0, C1, ..., C0, C1, ...]. One kernel snapshot is
    /// taken for the whole buffer. Unconfigured equalizers pass audio
    /// through unchanged.
    ///
    /// # Real-time Safety
    /// No allocations. With auto-update enabled, a pending gain change
    /// costs one kernel design on this call.
    pub fn process_interleaved(&mut self, buffer: &mut [S]) {
        let channels = self.channels.len();
        if channels == 0 {
            return;
        }

        if self.config.auto_update {
            if let Err(e) = self.handle.update_if_needed() {
                debug!("Auto-update skipped: {}", e);
            }
        }

        let kernel = self.handle.store().active();
        for frame in buffer.chunks_exact_mut(channels) {
            for (sample, fir) in frame.iter_mut().zip(self.channels.iter_mut()) {
                *sample = fir.process_with(&kernel, *sample);
            }
        }
    }

    /// Clear every channel's history
    pub fn reset(&mut self) {
        for fir in &mut self.channels {
            fir.reset();
        }
    }
}

impl<S: Sample, const TAPS: usize, const BANDS: usize> Default for NBandEqualizer<S, TAPS, BANDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sample, const TAPS: usize, const BANDS: usize> AudioProcessor<S>
    for NBandEqualizer<S, TAPS, BANDS>
{
    fn process(&mut self, buffer: &mut [S]) {
        self.process_interleaved(buffer);
    }

    fn reset(&mut self) {
        NBandEqualizer::reset(self);
    }

    fn channels(&self) -> usize {
        self.channels.len()
    }

    fn name(&self) -> &'static str {
        "N-Band FIR Equalizer"
    }
}
