//! Visualization Tap
//!
//! A pass-through stage that keeps a rolling history of the downmixed
//! signal so the UI can run spectrum analysis on it.
//!
//! # Architecture
//!
//! ```text
//! Audio thread:  VisualizationTap::process -> TapBuffer::push (single writer)
//! UI thread:     TapBuffer::snapshot (any number of readers, lock-free)
//! ```
//!
//! The history is a fixed array of `AtomicU32` cells holding `f32` bits plus
//! an atomic cursor. Nothing on the audio path allocates or locks.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::frame::SampleFrame;
use crate::processor::FrameProcessor;

/// Default history length in samples
pub const TAP_CAPACITY: usize = 4096;

/// Fixed-capacity ring of mono samples
///
/// A snapshot taken while the writer is active may contain a sample from
/// the following write in its oldest slot. For visualization that is fine.
pub struct TapBuffer {
    samples: Box<[AtomicU32]>,
    /// Index of the next slot to write, always < capacity
    cursor: AtomicUsize,
}

impl TapBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let samples = (0..capacity)
            .map(|_| AtomicU32::new(0.0_f32.to_bits()))
            .collect();
        Self {
            samples,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Append one sample, overwriting the oldest
    ///
    /// Must only be called from one thread at a time.
    #[inline]
    pub fn push(&self, sample: f32) {
        let pos = self.cursor.load(Ordering::Relaxed);
        self.samples[pos].store(sample.to_bits(), Ordering::Relaxed);
        self.cursor
            .store((pos + 1) % self.samples.len(), Ordering::Release);
    }

    /// Append the downmix of every frame, publishing the cursor once
    pub fn push_frames(&self, frames: &[SampleFrame]) {
        let capacity = self.samples.len();
        let mut pos = self.cursor.load(Ordering::Relaxed);
        for frame in frames {
            self.samples[pos].store(frame.downmix().to_bits(), Ordering::Relaxed);
            pos = (pos + 1) % capacity;
        }
        self.cursor.store(pos, Ordering::Release);
    }

    /// Fill `out` with the most recent `out.len()` samples, oldest first.
    ///
    /// Lengths beyond capacity are clamped; the returned count is how many
    /// leading entries of `out` were written. Unwritten history reads as 0.
    pub fn snapshot_into(&self, out: &mut [f32]) -> usize {
        let capacity = self.samples.len();
        let n = out.len().min(capacity);
        let end = self.cursor.load(Ordering::Acquire);
        let start = (end + capacity - n) % capacity;

        for (i, slot) in out[..n].iter_mut().enumerate() {
            let idx = (start + i) % capacity;
            *slot = f32::from_bits(self.samples[idx].load(Ordering::Relaxed));
        }
        n
    }

    /// The most recent `n` samples (clamped to capacity), oldest first
    pub fn snapshot(&self, n: usize) -> Vec<f32> {
        let mut out = vec![0.0; n.min(self.samples.len())];
        self.snapshot_into(&mut out);
        out
    }
}

impl Default for TapBuffer {
    fn default() -> Self {
        Self::new(TAP_CAPACITY)
    }
}

/// Records `(left + right) / 2` of every frame and passes the frame through
/// unchanged.
pub struct VisualizationTap {
    buffer: Arc<TapBuffer>,
}

impl VisualizationTap {
    pub fn new(buffer: Arc<TapBuffer>) -> Self {
        Self { buffer }
    }

    /// Shared handle for readers
    pub fn buffer(&self) -> Arc<TapBuffer> {
        Arc::clone(&self.buffer)
    }
}

impl FrameProcessor for VisualizationTap {
    #[inline]
    fn process(&mut self, frame: SampleFrame) -> SampleFrame {
        self.buffer.push(frame.downmix());
        frame
    }

    fn process_block(&mut self, frames: &mut [SampleFrame]) {
        self.buffer.push_frames(frames);
    }

    fn name(&self) -> &'static str {
        "Visualization Tap"
    }
}
