//! Filtered Byte Streams
//!
//! Inserts an [`AudioProcessor`] into an `io::Read` source or `io::Write`
//! sink carrying interleaved little-endian PCM. Callers keep the same
//! `Read`/`Write` surface they had before the equalizer was added.
//!
//! Only whole frames reach the processor. On the write side an incomplete
//! trailing frame waits for the next write; on the read side a trailing
//! fragment at end of stream is handed through unfiltered.
//!
//! Filtered bytes the inner writer has not accepted yet are kept and sent
//! before any new input is filtered. A `write` that returns `Err` has not
//! consumed its buffer, so retrying it never filters the same audio twice.

use std::io::{self, Read, Write};
use std::marker::PhantomData;

use fireq_dsp::{AudioProcessor, Sample};
use tracing::{debug, warn};

use crate::error::EqError;

/// Frames pulled from the inner reader per fill
const READ_BLOCK_FRAMES: usize = 1024;

/// Byte stream adapter that filters PCM through a processor
pub struct FilteredStream<T, S: Sample, P: AudioProcessor<S>> {
    inner: T,
    processor: P,
    /// Write side: raw bytes of an incomplete frame
    partial: Vec<u8>,
    /// Write side: filtered frames, sent up to `written`
    outbound: Vec<u8>,
    written: usize,
    /// Read side: raw bytes not yet filtered
    incoming: Vec<u8>,
    /// Read side: filtered bytes not yet handed out
    ready: Vec<u8>,
    ready_pos: usize,
    _sample: PhantomData<fn() -> S>,
}

impl<T, S: Sample, P: AudioProcessor<S>> FilteredStream<T, S, P> {
    pub fn new(inner: T, processor: P) -> Self {
        Self {
            inner,
            processor,
            partial: Vec::new(),
            outbound: Vec::new(),
            written: 0,
            incoming: Vec::new(),
            ready: Vec::new(),
            ready_pos: 0,
            _sample: PhantomData,
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Mutable access to the processor, e.g. to change gains or reconfigure
    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    /// Bytes held back from the inner writer: an incomplete frame plus
    /// filtered frames it has not accepted yet
    pub fn buffered_len(&self) -> usize {
        self.partial.len() + self.outbound.len() - self.written
    }

    /// Unwrap the inner stream, discarding anything still buffered
    pub fn into_inner(self) -> T {
        let unsent = self.buffered_len();
        if unsent > 0 {
            debug!("Dropping {} buffered bytes", unsent);
        }
        self.inner
    }

    fn frame_bytes(&self) -> io::Result<usize> {
        match self.processor.frame_bytes() {
            0 => Err(EqError::NotConfigured.into()),
            frame => Ok(frame),
        }
    }
}

/// Filter whole frames in place, failing if the processor skipped any
fn filter_frames<S: Sample, P: AudioProcessor<S>>(
    processor: &mut P,
    bytes: &mut [u8],
) -> io::Result<()> {
    let expected = bytes.len();
    let processed = processor.process_bytes(bytes);
    if processed != expected {
        warn!("{} filtered {} of {} bytes", processor.name(), processed, expected);
        return Err(EqError::IncompleteProcessing {
            processed,
            expected,
        }
        .into());
    }
    Ok(())
}

impl<T: Write, S: Sample, P: AudioProcessor<S>> FilteredStream<T, S, P> {
    /// Send filtered frames the inner writer has not accepted yet
    fn send_outbound(&mut self) -> io::Result<()> {
        while self.written < self.outbound.len() {
            match self.inner.write(&self.outbound[self.written..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write filtered audio",
                    ))
                }
                Ok(n) => self.written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.outbound.clear();
        self.written = 0;
        Ok(())
    }

    /// Send buffered frames, write any incomplete frame through unfiltered,
    /// flush, and unwrap
    pub fn finish(mut self) -> io::Result<T> {
        self.send_outbound()?;
        if !self.partial.is_empty() {
            self.inner.write_all(&self.partial)?;
            self.partial.clear();
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<T: Write, S: Sample, P: AudioProcessor<S>> Write for FilteredStream<T, S, P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let frame = self.frame_bytes()?;

        // Nothing of `buf` is taken until earlier output is out
        self.send_outbound()?;

        let total = self.partial.len() + buf.len();
        let whole = total / frame * frame;
        if whole == 0 {
            self.partial.extend_from_slice(buf);
            return Ok(buf.len());
        }

        self.outbound.extend_from_slice(&self.partial);
        self.outbound.extend_from_slice(buf);
        let filtered = filter_frames::<S, P>(&mut self.processor, &mut self.outbound[..whole]);
        if let Err(e) = filtered {
            self.outbound.clear();
            return Err(e);
        }
        self.partial.clear();
        self.partial.extend_from_slice(&self.outbound[whole..]);
        self.outbound.truncate(whole);

        // `buf` is consumed; a sink error here resurfaces on the next call
        if let Err(e) = self.send_outbound() {
            debug!("Holding {} filtered bytes: {}", self.outbound.len() - self.written, e);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_outbound()?;
        self.inner.flush()
    }
}

impl<T: Read, S: Sample, P: AudioProcessor<S>> FilteredStream<T, S, P> {
    /// Pull raw bytes until frame-aligned or end of stream, then filter them
    fn fill(&mut self) -> io::Result<()> {
        let frame = self.frame_bytes()?;
        let target = frame * READ_BLOCK_FRAMES;
        let mut eof = false;

        while (self.incoming.is_empty() || self.incoming.len() % frame != 0)
            && self.incoming.len() < target
        {
            let start = self.incoming.len();
            self.incoming.resize(target, 0);
            match self.inner.read(&mut self.incoming[start..]) {
                Ok(0) => {
                    self.incoming.truncate(start);
                    eof = true;
                    break;
                }
                Ok(n) => self.incoming.truncate(start + n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => self.incoming.truncate(start),
                Err(e) => {
                    self.incoming.truncate(start);
                    return Err(e);
                }
            }
        }

        let whole = self.incoming.len() / frame * frame;
        filter_frames::<S, P>(&mut self.processor, &mut self.incoming[..whole])?;
        let served = if eof { self.incoming.len() } else { whole };

        self.ready.clear();
        self.ready_pos = 0;
        self.ready.extend(self.incoming.drain(..served));
        Ok(())
    }
}

impl<T: Read, S: Sample, P: AudioProcessor<S>> Read for FilteredStream<T, S, P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.ready_pos >= self.ready.len() {
            self.fill()?;
        }

        let available = &self.ready[self.ready_pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.ready_pos += n;
        Ok(n)
    }
}

impl<T, S: Sample, P: AudioProcessor<S>> std::fmt::Debug for FilteredStream<T, S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredStream")
            .field("processor", &self.processor.name())
            .field("buffered", &self.buffered_len())
            .field("ready", &(self.ready.len() - self.ready_pos))
            .finish()
    }
}
