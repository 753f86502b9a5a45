//! Frame Processor Trait
//!
//! Defines the interface for chainable per-frame stages.
//! The playback chain is built as an ordered list: EQ -> Gain -> Tap.

use crate::frame::SampleFrame;

/// Trait for stages in the playback chain
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()` and `process_block()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - NO unbounded loops
/// - Constant or O(n) time complexity where n = block length
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait FrameProcessor: Send {
    /// Process a single frame
    fn process(&mut self, frame: SampleFrame) -> SampleFrame;

    /// Process a block of frames in-place
    ///
    /// Stages override this to read their live parameters once per block
    /// instead of once per frame.
    fn process_block(&mut self, frames: &mut [SampleFrame]) {
        for frame in frames.iter_mut() {
            *frame = self.process(*frame);
        }
    }

    /// Human-readable name for debugging/logging
    fn name(&self) -> &'static str;
}

/// A chain of processors applied sequentially, in insertion order
pub struct ProcessorChain {
    processors: Vec<Box<dyn FrameProcessor>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Add a processor to the end of the chain
    ///
    /// Note: This allocates. Only call during setup, not in audio callback.
    pub fn add<P: FrameProcessor + 'static>(&mut self, processor: P) {
        self.processors.push(Box::new(processor));
    }

    /// Builder form of [`ProcessorChain::add`]
    pub fn with<P: FrameProcessor + 'static>(mut self, processor: P) -> Self {
        self.add(processor);
        self
    }

    /// Process a block through every processor, in order
    #[inline]
    pub fn process(&mut self, frames: &mut [SampleFrame]) {
        if frames.is_empty() {
            return;
        }
        for processor in &mut self.processors {
            processor.process_block(frames);
        }
    }

    /// Stage names in processing order
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Get number of processors in chain
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Check if chain is empty
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Default for ProcessorChain {
    fn default() -> Self {
        Self::new()
    }
}
