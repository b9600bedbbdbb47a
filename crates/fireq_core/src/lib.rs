//! fireq Core - N-Band Equalizer
//!
//! This crate wraps the fireq DSP primitives into a ready-to-use equalizer:
//! - `NBandEqualizer` facade owning one FIR convolver per channel
//! - Thread-safe `EqualizerHandle` for gain changes from control threads
//! - Audio format validation and serializable configuration
//! - `FilteredStream` adapter for `io::Read` / `io::Write` PCM streams
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Control Thread(s)                       │
//! │   EqualizerHandle ──set gains──▶ pending ──update()──▶      │
//! │                 KernelDesigner (float, outside locks)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ publish: staging ──swap──▶ active
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   bytes ──FilteredStream──▶ NBandEqualizer ──▶ bytes        │
//! │              FirConvolver per channel (active kernel)       │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod control;
mod equalizer;
mod error;
mod stream;

pub use config::{AudioInfo, EqualizerConfig, MAX_CHANNELS};
pub use control::EqualizerHandle;
pub use equalizer::NBandEqualizer;
pub use error::{EqError, EqResult};
pub use stream::FilteredStream;

// Re-export DSP types for convenience
pub use fireq_dsp::{AudioProcessor, Band, DspError, Kernel, Sample, I24};
