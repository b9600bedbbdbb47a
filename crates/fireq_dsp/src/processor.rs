//! Audio Processor Trait
//!
//! Common interface for anything that filters interleaved PCM buffers in
//! place. Stream adapters are written against this trait so any processor
//! can be slotted between a source and a sink.

use crate::sample::Sample;

/// Samples decoded per pass in [`AudioProcessor::process_bytes`]
pub const BYTE_BLOCK_SAMPLES: usize = 512;

/// Trait for in-place audio processors
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO blocking syscalls (no file I/O, no network)
/// - NO unbounded loops
/// - Constant or O(n) time complexity where n = buffer size
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait AudioProcessor<S: Sample>: Send {
    /// Process an interleaved buffer in place
    ///
    /// Buffer format is interleaved: [C0, C1, ..., C0, C1, ...]. A trailing
    /// partial frame is left untouched.
    fn process(&mut self, buffer: &mut [S]);

    /// Reset internal state (delay lines)
    fn reset(&mut self);

    /// Interleaved channel count; 0 means not configured
    fn channels(&self) -> usize;

    /// Human-readable name for debugging/UI
    fn name(&self) -> &'static str;

    /// Bytes in one interleaved frame
    fn frame_bytes(&self) -> usize {
        self.channels() * S::BYTES
    }

    /// Process interleaved little-endian PCM bytes in place
    ///
    /// Only whole frames are touched; returns the number of bytes processed.
    /// Decodes through a fixed stack block, so no allocation happens here.
    fn process_bytes(&mut self, bytes: &mut [u8]) -> usize {
        let channels = self.channels();
        if channels == 0 || channels > BYTE_BLOCK_SAMPLES {
            return 0;
        }
        let frame = channels * S::BYTES;
        let whole = bytes.len() / frame * frame;
        let block_bytes = (BYTE_BLOCK_SAMPLES / channels) * frame;

        let mut block = [S::default(); BYTE_BLOCK_SAMPLES];
        for chunk in bytes[..whole].chunks_mut(block_bytes) {
            let count = chunk.len() / S::BYTES;
            for (sample, raw) in block.iter_mut().zip(chunk.chunks_exact(S::BYTES)) {
                *sample = S::read_le(raw);
            }
            self.process(&mut block[..count]);
            for (sample, raw) in block.iter().zip(chunk.chunks_exact_mut(S::BYTES)) {
                sample.write_le(raw);
            }
        }
        whole
    }
}
