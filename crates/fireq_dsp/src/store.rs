//! Double-Buffered Kernel Store
//!
//! Two kernel buffers swap between the "active" role (read by the audio
//! path) and the "staging" role (written by the designer).
//!
//! # Concurrency
//!
//! - Readers load the active index (`Acquire`) and take a read lock on that
//!   buffer for one processing block.
//! - The single writer write-locks the staging buffer, fills it, then
//!   publishes it with one `Release` store of the index.
//! - A reader that loaded the index just before a swap and is still holding
//!   the old buffer when the *next* publish starts makes that writer wait;
//!   a reader can only ever block on an O(TAPS) copy, never on a design.
//!
//! Either way a reader sees one complete kernel, never a mix of two.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard};

use crate::kernel::Kernel;

/// Read access to the active kernel for one block
pub type KernelGuard<'a, const TAPS: usize> = RwLockReadGuard<'a, Kernel<TAPS>>;

/// Two kernel buffers and the index of the active one
pub struct KernelStore<const TAPS: usize> {
    kernels: [RwLock<Kernel<TAPS>>; 2],
    active: AtomicUsize,
    /// Serializes publishers so two never target the same staging buffer
    publisher: Mutex<()>,
}

impl<const TAPS: usize> KernelStore<TAPS> {
    /// Both buffers start as the identity kernel
    pub fn new() -> Self {
        Self {
            kernels: [
                RwLock::new(Kernel::identity()),
                RwLock::new(Kernel::identity()),
            ],
            active: AtomicUsize::new(0),
            publisher: Mutex::new(()),
        }
    }

    /// Index (0 or 1) of the buffer currently read by the audio path
    #[inline]
    pub fn active_index(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Read snapshot of the active kernel
    ///
    /// # Real-time Safety
    /// Hold the guard for one block only. Dropping it before the next
    /// block lets the following swap take effect.
    #[inline]
    pub fn active(&self) -> KernelGuard<'_, TAPS> {
        self.kernels[self.active_index()].read()
    }

    /// Copy of the active kernel
    pub fn snapshot(&self) -> Kernel<TAPS> {
        self.active().clone()
    }

    /// Fill the staging buffer with `write`, then make it active
    ///
    /// The closure runs under the staging buffer's write lock, so keep it
    /// to O(TAPS) work: do the design first, copy the result in here.
    pub fn publish<F>(&self, write: F)
    where
        F: FnOnce(&mut Kernel<TAPS>),
    {
        let _publisher = self.publisher.lock();
        let staging = 1 - self.active.load(Ordering::Acquire);
        {
            let mut kernel = self.kernels[staging].write();
            write(&mut kernel);
        }
        self.active.store(staging, Ordering::Release);
    }

    /// Reset both buffers to identity and make buffer 0 active
    pub fn reset(&self) {
        let _publisher = self.publisher.lock();
        for kernel in &self.kernels {
            *kernel.write() = Kernel::identity();
        }
        self.active.store(0, Ordering::Release);
    }
}

impl<const TAPS: usize> Default for KernelStore<TAPS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const TAPS: usize> std::fmt::Debug for KernelStore<TAPS> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelStore")
            .field("taps", &TAPS)
            .field("active", &self.active_index())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn test_starts_with_identity() {
        let store = KernelStore::<64>::new();
        assert_eq!(store.active_index(), 0);
        assert!(store.active().is_identity());
    }

    #[test]
    fn test_publish_swaps_roles() {
        let store = KernelStore::<16>::new();
        store.publish(|k| *k = Kernel::filled(5));
        assert_eq!(store.active_index(), 1);
        assert_eq!(store.snapshot(), Kernel::filled(5));

        store.publish(|k| *k = Kernel::filled(9));
        assert_eq!(store.active_index(), 0);
        assert_eq!(store.snapshot(), Kernel::filled(9));
    }

    #[test]
    fn test_staging_write_never_touches_active() {
        let store = KernelStore::<16>::new();
        store.publish(|k| *k = Kernel::filled(1));
        let before = store.snapshot();
        store.publish(|k| {
            // While staging is being written, the active buffer is unchanged
            assert_eq!(*k, Kernel::identity());
            *k = Kernel::filled(2);
        });
        assert_eq!(before, Kernel::filled(1));
        assert_eq!(store.snapshot(), Kernel::filled(2));
    }

    #[test]
    fn test_reset() {
        let store = KernelStore::<16>::new();
        store.publish(|k| *k = Kernel::filled(3));
        store.reset();
        assert_eq!(store.active_index(), 0);
        assert!(store.active().is_identity());
    }

    #[test]
    fn test_no_torn_reads_across_threads() {
        const TAPS: usize = 256;
        let store = Arc::new(KernelStore::<TAPS>::new());
        store.publish(|k| *k = Kernel::filled(1));
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                for value in 2..2000i16 {
                    store.publish(|k| {
                        for tap in k.taps_mut().iter_mut() {
                            *tap = value;
                        }
                    });
                }
                done.store(true, Ordering::Release);
            })
        };

        let mut reads = 0u64;
        while !done.load(Ordering::Acquire) || reads == 0 {
            let kernel = store.active();
            let first = kernel.tap(0);
            assert!(
                kernel.taps().iter().all(|&c| c == first),
                "observed a kernel mixing two generations"
            );
            reads += 1;
        }

        writer.join().unwrap();
        assert_eq!(store.snapshot(), Kernel::filled(1999));
    }
}
