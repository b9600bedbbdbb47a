//! Equalizer Control Handle
//!
//! Gain state and kernel rebuilds, shared between the audio thread (which
//! owns the facade) and any number of control threads.
//!
//! ```text
//!  control thread                         audio thread
//!  set_band_gain_db ──▶ pending (atomic)
//!  update() ──try_lock──▶ designer ──▶ staging ──swap──▶ active ◀── convolvers
//! ```
//!
//! - Setters never block: they store f32 bits into per-band atomics and
//!   raise the dirty flag.
//! - `update()` takes the designer with `try_lock`; a second concurrent
//!   rebuild returns `Ok(false)` immediately and the dirty flag stays set
//!   for the next attempt.
//! - The O(TAPS x BANDS) design runs holding only the designer lock; the
//!   audio path only ever touches the kernel store.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use fireq_dsp::{
    clamp_gain_db, db_to_normalized, normalized_to_db, Band, BandPlan, DspError, Kernel,
    KernelDesigner, KernelStore,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{EqError, EqResult};

/// f32 cell stored as bits (there is no `AtomicF32`)
struct AtomicGain(AtomicU32);

impl AtomicGain {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    #[inline]
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

struct ControlState<const TAPS: usize, const BANDS: usize> {
    /// Gains written by the setters
    pending: [AtomicGain; BANDS],
    /// Mirror of the designer's committed gains for lock-free readers
    committed: [AtomicGain; BANDS],
    /// Pending gains differ from what the active kernel was built with
    dirty: AtomicBool,
    /// 0.0 while not configured
    sample_rate: AtomicGain,
    plan: RwLock<Option<BandPlan<BANDS>>>,
    /// `None` until configured; `try_lock` doubles as the re-entrancy guard
    designer: Mutex<Option<KernelDesigner<TAPS, BANDS>>>,
    store: Arc<KernelStore<TAPS>>,
}

impl<const TAPS: usize, const BANDS: usize> ControlState<TAPS, BANDS> {
    /// Commit pending gains, design, and publish; caller holds the designer
    fn rebuild(&self, designer: &mut KernelDesigner<TAPS, BANDS>) {
        // Clear before snapshotting so a setter racing with this rebuild
        // leaves the flag raised for the next one
        self.dirty.store(false, Ordering::Release);
        let gains: [f32; BANDS] = core::array::from_fn(|band| self.pending[band].load());
        designer.commit_gains(&gains);

        designer.design();
        self.store.publish(|staging| designer.quantize_into(staging));

        for (cell, &gain) in self.committed.iter().zip(designer.committed_gains()) {
            cell.store(gain);
        }
        debug!("FIR kernel updated for {} bands / {} taps", BANDS, TAPS);
    }
}

/// Cloneable, thread-safe handle to an equalizer's gains and kernel
///
/// Obtained from [`crate::NBandEqualizer::handle`]; every clone controls the
/// same equalizer.
pub struct EqualizerHandle<const TAPS: usize = 128, const BANDS: usize = 12> {
    inner: Arc<ControlState<TAPS, BANDS>>,
}

impl<const TAPS: usize, const BANDS: usize> Clone for EqualizerHandle<TAPS, BANDS> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<const TAPS: usize, const BANDS: usize> EqualizerHandle<TAPS, BANDS> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(ControlState {
                pending: core::array::from_fn(|_| AtomicGain::new(0.0)),
                committed: core::array::from_fn(|_| AtomicGain::new(0.0)),
                dirty: AtomicBool::new(false),
                sample_rate: AtomicGain::new(0.0),
                plan: RwLock::new(None),
                designer: Mutex::new(None),
                store: Arc::new(KernelStore::new()),
            }),
        }
    }

    pub(crate) fn store(&self) -> &Arc<KernelStore<TAPS>> {
        &self.inner.store
    }

    /// Set up band plan and window for `sample_rate`, then force a rebuild
    ///
    /// Nothing changes if the configuration is rejected.
    pub(crate) fn configure(&self, sample_rate: f32) -> EqResult<()> {
        let mut designer = KernelDesigner::<TAPS, BANDS>::new(sample_rate)?;
        let plan = *designer.plan();

        // Waits for an in-flight rebuild; configuration is not real-time
        let mut slot = self.inner.designer.lock();
        *self.inner.plan.write() = Some(plan);
        self.inner.store.reset();
        self.inner.sample_rate.store(sample_rate);
        self.inner.rebuild(&mut designer);
        *slot = Some(designer);
        Ok(())
    }

    pub(crate) fn deconfigure(&self) {
        let mut slot = self.inner.designer.lock();
        *slot = None;
        *self.inner.plan.write() = None;
        self.inner.sample_rate.store(0.0);
    }

    fn check_band(band: usize) -> EqResult<()> {
        if band >= BANDS {
            return Err(DspError::InvalidBandIndex {
                index: band,
                bands: BANDS,
            }
            .into());
        }
        Ok(())
    }

    /// Request a gain in dB (clamped to -90..+12) for `band`
    ///
    /// Takes effect on the next rebuild; never touches the kernel itself.
    pub fn set_band_gain_db(&self, band: usize, gain_db: f32) -> EqResult<()> {
        Self::check_band(band)?;
        self.inner.pending[band].store(clamp_gain_db(gain_db));
        self.inner.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Request a normalized gain: -1..0 maps to -90..0 dB, 0..1 to 0..+12 dB
    pub fn set_band_gain_normalized(&self, band: usize, value: f32) -> EqResult<()> {
        self.set_band_gain_db(band, normalized_to_db(value))
    }

    /// Request the same normalized gain on every band
    pub fn set_all_band_gains_normalized(&self, value: f32) {
        let gain_db = clamp_gain_db(normalized_to_db(value));
        for cell in &self.inner.pending {
            cell.store(gain_db);
        }
        self.inner.dirty.store(true, Ordering::Release);
    }

    /// Replace every pending gain at once (dB, clamped)
    pub fn set_band_gains_db(&self, gains_db: &[f32; BANDS]) {
        for (cell, &gain) in self.inner.pending.iter().zip(gains_db) {
            cell.store(clamp_gain_db(gain));
        }
        self.inner.dirty.store(true, Ordering::Release);
    }

    /// Requested gain in dB, or 0.0 for an out-of-range band
    pub fn band_gain_db(&self, band: usize) -> f32 {
        self.inner.pending.get(band).map_or(0.0, AtomicGain::load)
    }

    /// Requested gain as a normalized -1..1 value, or 0.0 if out of range
    pub fn band_gain_normalized(&self, band: usize) -> f32 {
        self.inner
            .pending
            .get(band)
            .map_or(0.0, |cell| db_to_normalized(cell.load()))
    }

    /// Center frequency in Hz, or 0.0 if out of range or not configured
    pub fn band_frequency_hz(&self, band: usize) -> f32 {
        self.inner
            .plan
            .read()
            .as_ref()
            .and_then(|plan| plan.frequency(band))
            .unwrap_or(0.0)
    }

    /// Full snapshot of one band
    pub fn band(&self, band: usize) -> Option<Band> {
        if band >= BANDS {
            return None;
        }
        Some(Band {
            index: band,
            center_frequency_hz: self.band_frequency_hz(band),
            committed_gain_db: self.inner.committed[band].load(),
            pending_gain_db: self.inner.pending[band].load(),
        })
    }

    pub fn bands(&self) -> Vec<Band> {
        (0..BANDS).filter_map(|band| self.band(band)).collect()
    }

    pub const fn band_count(&self) -> usize {
        BANDS
    }

    pub const fn tap_count(&self) -> usize {
        TAPS
    }

    /// Configured sample rate in Hz, 0.0 before `begin()`
    pub fn sample_rate(&self) -> f32 {
        self.inner.sample_rate.load()
    }

    pub fn is_configured(&self) -> bool {
        self.sample_rate() > 0.0
    }

    /// Gain changes are waiting for a rebuild
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::Acquire)
    }

    /// A rebuild (or reconfiguration) is in flight
    pub fn is_updating(&self) -> bool {
        self.inner.designer.is_locked()
    }

    /// Copy of the kernel the audio path is currently using
    pub fn active_kernel(&self) -> Kernel<TAPS> {
        self.inner.store.snapshot()
    }

    /// Rebuild the kernel from the pending gains
    ///
    /// Returns `Ok(true)` when a new kernel was published and `Ok(false)`
    /// when another rebuild was already running (the request stays pending).
    pub fn update(&self) -> EqResult<bool> {
        if !self.is_configured() {
            return Err(EqError::NotConfigured);
        }
        let Some(mut slot) = self.inner.designer.try_lock() else {
            debug!("Kernel rebuild already in progress, request deferred");
            return Ok(false);
        };
        let designer = slot.as_mut().ok_or(EqError::NotConfigured)?;
        self.inner.rebuild(designer);
        Ok(true)
    }

    /// Rebuild only if gains changed since the last rebuild
    pub fn update_if_needed(&self) -> EqResult<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.update()
    }

    /// Log the band table
    pub(crate) fn log_bands(&self) {
        for band in self.bands() {
            info!(
                "Band {}: Freq={:.2}Hz, Gain={:.2}dB",
                band.index, band.center_frequency_hz, band.pending_gain_db
            );
        }
    }
}

impl<const TAPS: usize, const BANDS: usize> std::fmt::Debug for EqualizerHandle<TAPS, BANDS> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EqualizerHandle")
            .field("taps", &TAPS)
            .field("bands", &BANDS)
            .field("sample_rate", &self.sample_rate())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
