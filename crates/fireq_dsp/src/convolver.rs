//! Per-Channel FIR Convolver
//!
//! Direct-form FIR: a circular history of the last `TAPS` inputs dotted
//! with the active Q15 kernel, accumulated wide and saturated on the way out.

use std::sync::Arc;

use crate::kernel::Kernel;
use crate::processor::AudioProcessor;
use crate::sample::Sample;
use crate::store::KernelStore;

/// Push `sample` into the ring and return the filtered output
#[inline]
fn convolve<S: Sample, const TAPS: usize>(
    history: &mut [S; TAPS],
    cursor: &mut usize,
    kernel: &Kernel<TAPS>,
    sample: S,
) -> S {
    if TAPS == 0 {
        return sample;
    }
    history[*cursor] = sample;

    // history[cursor - k] pairs with tap k, walking backwards through time
    let (newer, older) = history.split_at(*cursor + 1);
    let acc = newer
        .iter()
        .rev()
        .chain(older.iter().rev())
        .zip(kernel.taps())
        .fold(S::ZERO, |acc, (&x, &c)| acc + x.mul_q15(c));

    *cursor += 1;
    if *cursor == TAPS {
        *cursor = 0;
    }

    S::from_q15(acc)
}

/// FIR state for one audio channel
pub struct FirConvolver<S: Sample, const TAPS: usize> {
    history: [S; TAPS],
    cursor: usize,
    store: Option<Arc<KernelStore<TAPS>>>,
}

impl<S: Sample, const TAPS: usize> FirConvolver<S, TAPS> {
    /// A convolver with no kernel passes samples through unchanged
    pub fn new() -> Self {
        Self {
            history: [S::default(); TAPS],
            cursor: 0,
            store: None,
        }
    }

    pub fn with_store(store: Arc<KernelStore<TAPS>>) -> Self {
        let mut convolver = Self::new();
        convolver.set_store(store);
        convolver
    }

    /// Point this channel at a kernel store
    pub fn set_store(&mut self, store: Arc<KernelStore<TAPS>>) {
        self.store = Some(store);
    }

    pub fn has_kernel(&self) -> bool {
        self.store.is_some()
    }

    /// Filter one sample against the store's active kernel
    #[inline]
    pub fn process(&mut self, sample: S) -> S {
        let Some(store) = &self.store else {
            return sample;
        };
        let kernel = store.active();
        convolve(&mut self.history, &mut self.cursor, &kernel, sample)
    }

    /// Filter one sample against a kernel snapshot the caller already holds
    ///
    /// # Real-time Safety
    /// No allocations, no locks. O(TAPS).
    #[inline]
    pub fn process_with(&mut self, kernel: &Kernel<TAPS>, sample: S) -> S {
        convolve(&mut self.history, &mut self.cursor, kernel, sample)
    }

    /// Filter a mono block in place with one kernel snapshot
    pub fn process_block(&mut self, samples: &mut [S]) {
        let Some(store) = &self.store else {
            return;
        };
        let kernel = store.active();
        for sample in samples.iter_mut() {
            *sample = convolve(&mut self.history, &mut self.cursor, &kernel, *sample);
        }
    }

    /// Clear the history (e.g. when the source changes)
    pub fn reset(&mut self) {
        self.history = [S::default(); TAPS];
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<S: Sample, const TAPS: usize> Default for FirConvolver<S, TAPS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sample, const TAPS: usize> AudioProcessor<S> for FirConvolver<S, TAPS> {
    fn process(&mut self, buffer: &mut [S]) {
        self.process_block(buffer);
    }

    fn reset(&mut self) {
        FirConvolver::reset(self);
    }

    fn channels(&self) -> usize {
        1
    }

    fn name(&self) -> &'static str {
        "FIR Convolver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::KernelDesigner;

    #[test]
    fn test_without_kernel_is_identity() {
        let mut fir = FirConvolver::<i16, 32>::new();
        assert!(!fir.has_kernel());
        assert_eq!(fir.process(1234), 1234);
        assert_eq!(fir.process(-7), -7);
    }

    #[test]
    fn test_identity_kernel_delays_by_center() {
        let store = Arc::new(KernelStore::<9>::new());
        let mut fir = FirConvolver::<i32, 9>::with_store(store);

        let input: Vec<i32> = (1..=20).map(|i| i * 1000).collect();
        let output: Vec<i32> = input.iter().map(|&x| fir.process(x)).collect();

        // Unity at tap 4 means a 4-sample delay with gain 32767/32768
        for n in 4..input.len() {
            let expected = ((input[n - 4] as i64 * 32767) >> 15) as i32;
            assert_eq!(output[n], expected);
        }
        assert!(output[..4].iter().all(|&y| y == 0));
    }

    #[test]
    fn test_impulse_reproduces_kernel() {
        let store = Arc::new(KernelStore::<128>::new());
        let mut designer = KernelDesigner::<128, 12>::new(44100.0).unwrap();
        let mut gains = [0.0; 12];
        gains[3] = 9.0;
        gains[8] = -20.0;
        designer.commit_gains(&gains);
        store.publish(|k| designer.design_into(k));
        let kernel = store.snapshot();

        let mut fir = FirConvolver::<i32, 128>::with_store(Arc::clone(&store));
        for n in 0..128 {
            // 1 << 15 is unity in Q15, so the output is the raw coefficient
            let x = if n == 0 { 1 << 15 } else { 0 };
            assert_eq!(fir.process(x), kernel.tap(n) as i32, "tap {n}");
        }
    }

    #[test]
    fn test_output_saturates() {
        let store = Arc::new(KernelStore::<4>::new());
        store.publish(|k| *k = Kernel::filled(i16::MAX));
        let mut fir = FirConvolver::<i16, 4>::with_store(store);
        let mut last = 0;
        for _ in 0..4 {
            last = fir.process(i16::MAX);
        }
        assert_eq!(last, i16::MAX);

        for _ in 0..4 {
            last = fir.process(i16::MIN);
        }
        assert_eq!(last, i16::MIN);
    }

    #[test]
    fn test_float_samples_descale() {
        let store = Arc::new(KernelStore::<1>::new());
        let mut fir = FirConvolver::<f32, 1>::with_store(store);
        let y = fir.process(0.5);
        assert!((y - 0.5 * 32767.0 / 32768.0).abs() < 1e-6);
    }

    #[test]
    fn test_cursor_wraps_and_reset() {
        let mut fir = FirConvolver::<i16, 4>::with_store(Arc::new(KernelStore::new()));
        for _ in 0..6 {
            fir.process(100);
        }
        assert_eq!(fir.cursor(), 2);
        fir.reset();
        assert_eq!(fir.cursor(), 0);
    }

    #[test]
    fn test_block_matches_per_sample() {
        let store = Arc::new(KernelStore::<16>::new());
        store.publish(|k| {
            for (n, tap) in k.taps_mut().iter_mut().enumerate() {
                *tap = (n as i16 - 8) * 300;
            }
        });
        let input: Vec<i16> = (0..64).map(|i| ((i * 37) % 200 - 100) as i16 * 50).collect();

        let mut a = FirConvolver::<i16, 16>::with_store(Arc::clone(&store));
        let per_sample: Vec<i16> = input.iter().map(|&x| a.process(x)).collect();

        let mut b = FirConvolver::<i16, 16>::with_store(store);
        let mut block = input.clone();
        b.process_block(&mut block);

        assert_eq!(per_sample, block);
    }

    #[test]
    fn test_blocks_never_mix_kernels_while_publishing() {
        use std::sync::atomic::{AtomicBool, Ordering};

        const TAPS: usize = 64;
        let store = Arc::new(KernelStore::<TAPS>::new());
        store.publish(|k| *k = Kernel::filled(1));
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                for sentinel in 2..2000i16 {
                    store.publish(|k| *k = Kernel::filled(sentinel));
                }
                done.store(true, Ordering::Release);
            });

            let mut fir = FirConvolver::<i32, TAPS>::with_store(Arc::clone(&store));
            let mut blocks = 0u64;
            while !done.load(Ordering::Acquire) || blocks == 0 {
                // Unit impulse per block: every output is exactly one tap
                let mut block = [0i32; TAPS];
                block[0] = 1 << 15;
                fir.process_block(&mut block);

                let first = block[0];
                assert!(first >= 1, "impulse lost: {first}");
                assert!(
                    block.iter().all(|&y| y == first),
                    "one block mixed two kernels: {block:?}"
                );
                blocks += 1;
            }
        });
    }
}
