//! Playback Pipeline
//!
//! ```text
//! FrameSource -> [Resampler] -> EqChain -> GainStage -> VisualizationTap -> PlaybackGate -> device
//! ```
//!
//! A [`Pipeline`] is built on the control plane, then claimed by an output
//! device through its [`OutputSlot`](crate::OutputSlot). From then on the audio
//! callback drives it with [`Pipeline::pull`] while the control plane only
//! touches it under the slot lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use reel_dsp::{
    EqChain, EqGains, GainStage, ProcessorChain, SampleFrame, SharedGain, TapBuffer,
    VisualizationTap,
};
use tracing::{debug, error, info};

use crate::config::ResamplerConfig;
use crate::decoder::FrameSource;
use crate::error::{DecodeError, EngineResult};
use crate::message::Event;
use crate::resample::StreamResampler;

/// Pause control and end-of-stream latch at the tail of the pipeline
pub struct PlaybackGate {
    paused: bool,
    ended: bool,
    finished: Arc<AtomicBool>,
    events: Sender<Event>,
}

impl PlaybackGate {
    /// New gates start closed (paused) until playback is requested
    pub fn new(finished: Arc<AtomicBool>, events: Sender<Event>) -> Self {
        Self {
            paused: true,
            ended: false,
            finished,
            events,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Whether a pull may produce frames
    #[inline]
    pub fn is_open(&self) -> bool {
        !self.paused && !self.ended
    }

    /// Latch end of stream. The shared flag and the event fire at most once
    /// per track.
    fn mark_ended(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        if !self.finished.swap(true, Ordering::AcqRel) {
            let _ = self.events.try_send(Event::TrackFinished);
        }
    }

    /// Fatal mid-stream failure: end the track, then report it.
    ///
    /// The shared flag is already set by the time the error event can be
    /// received, so listeners can tell a failed track from a failed device.
    fn fail(&mut self, err: &DecodeError) {
        error!("Playback stream failed: {}", err);
        self.ended = true;
        let first = !self.finished.swap(true, Ordering::AcqRel);
        let _ = self.events.try_send(Event::error(err));
        if first {
            let _ = self.events.try_send(Event::TrackFinished);
        }
    }

    /// Clear the end latch after a seek
    fn rearm(&mut self) {
        self.ended = false;
    }
}

/// Read until `out` is full or the source is exhausted
fn read_full(source: &mut dyn FrameSource, out: &mut [SampleFrame]) -> Result<usize, DecodeError> {
    let mut filled = 0;
    while filled < out.len() {
        let n = source.read(&mut out[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Everything between the decoder and the output device for one track
pub struct Pipeline {
    source: Box<dyn FrameSource>,
    resampler: Option<StreamResampler>,
    chain: ProcessorChain,
    gate: PlaybackGate,
    output_rate: u32,
}

impl Pipeline {
    /// Assemble the pipeline for `source` playing at `output_rate`.
    ///
    /// Construction is all-or-nothing: on error nothing has been installed
    /// anywhere and `source` is dropped.
    pub fn new(
        source: Box<dyn FrameSource>,
        output_rate: u32,
        resampler_config: &ResamplerConfig,
        gains: &EqGains,
        volume: SharedGain,
        tap: Arc<TapBuffer>,
        gate: PlaybackGate,
    ) -> EngineResult<Self> {
        let source_rate = source.sample_rate();
        let resampler = if source_rate != output_rate {
            info!("Resampling {}Hz -> {}Hz", source_rate, output_rate);
            Some(StreamResampler::new(
                source_rate,
                output_rate,
                resampler_config,
            )?)
        } else {
            None
        };

        let chain = ProcessorChain::new()
            .with(EqChain::new(output_rate as f32, gains))
            .with(GainStage::new(volume))
            .with(VisualizationTap::new(tap));

        debug!("Pipeline stages: {:?}", chain.names());

        Ok(Self {
            source,
            resampler,
            chain,
            gate,
            output_rate,
        })
    }

    /// Produce up to `out.len()` processed frames.
    ///
    /// Returns 0 while paused or after the stream ended. A short count means
    /// the source ran out; the gate latches and reports it.
    pub fn pull(&mut self, out: &mut [SampleFrame]) -> usize {
        if out.is_empty() || !self.gate.is_open() {
            return 0;
        }

        let result = match self.resampler.as_mut() {
            Some(resampler) => resampler.pull(self.source.as_mut(), out),
            None => read_full(self.source.as_mut(), out),
        };

        let n = match result {
            Ok(n) => n,
            Err(e) => {
                self.gate.fail(&e);
                return 0;
            }
        };

        self.chain.process(&mut out[..n]);

        if n < out.len() {
            self.gate.mark_ended();
        }
        n
    }

    /// Current position in source frames
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// Track length in source frames
    pub fn len(&self) -> u64 {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn source_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    pub fn is_resampling(&self) -> bool {
        self.resampler.is_some()
    }

    /// Move to an absolute source frame, discarding resampler history
    pub fn seek(&mut self, frame: u64) -> EngineResult<()> {
        self.source.seek(frame)?;
        if let Some(resampler) = self.resampler.as_mut() {
            resampler.reset();
        }
        self.gate.rearm();
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.gate.set_paused(paused);
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    pub fn is_ended(&self) -> bool {
        self.gate.is_ended()
    }
}
