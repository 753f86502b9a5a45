//! CPAL Output Stream
//!
//! Handles the low-level CPAL stream setup and the real-time audio callback.
//!
//! ```text
//! CPAL callback ──lock──▶ OutputSlot ──pull──▶ Pipeline ──frames──▶ device buffer
//! ```
//!
//! The callback zero-fills the device buffer, then pulls processed frames in
//! chunks through a scratch buffer allocated once when the stream is built.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use reel_dsp::SampleFrame;
use tracing::{error, info, warn};

use crate::config::OutputConfig;
use crate::device::{find_output, OutputDevice, OutputSlot};
use crate::error::{EngineError, EngineResult};
use crate::message::Event;

/// Frames pulled per pipeline call inside the callback
const MIN_SCRATCH_FRAMES: usize = 1024;

/// A running CPAL output stream that plays whatever its slot holds
pub struct CpalOutput {
    /// The underlying CPAL stream (kept alive to maintain audio flow)
    _stream: Stream,
    slot: OutputSlot,
    sample_rate: u32,
    channels: u16,
    name: String,
}

impl CpalOutput {
    /// Open and start an output stream on the named device (or the default).
    ///
    /// A fixed buffer of `config.buffer_size` frames is requested first; if
    /// the device rejects it the device's default buffer size is used.
    pub fn open(
        config: &OutputConfig,
        device_name: Option<&str>,
        events: Sender<Event>,
    ) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;

        let device = find_output(device_name)?;
        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        let slot = OutputSlot::new();

        let fixed = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: BufferSize::Fixed(config.buffer_size),
        };
        let scratch_frames = (config.buffer_size as usize).max(MIN_SCRATCH_FRAMES);

        let stream = match build_output_stream(
            &device,
            &fixed,
            slot.clone(),
            scratch_frames,
            events.clone(),
        ) {
            Ok(stream) => stream,
            Err(e) => {
                warn!(
                    "{} rejected a {}-frame buffer ({}), using its default",
                    name, config.buffer_size, e
                );
                let fallback = StreamConfig {
                    buffer_size: BufferSize::Default,
                    ..fixed
                };
                build_output_stream(&device, &fallback, slot.clone(), scratch_frames, events)?
            }
        };

        stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

        info!(
            "Output stream on {}: {}Hz, {} channel(s), ~{:.0}ms buffer",
            name,
            config.sample_rate,
            config.channels,
            config.latency_ms()
        );

        Ok(Self {
            _stream: stream,
            slot,
            sample_rate: config.sample_rate,
            channels: config.channels,
            name,
        })
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl OutputDevice for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn slot(&self) -> &OutputSlot {
        &self.slot
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn build_output_stream(
    device: &Device,
    config: &StreamConfig,
    slot: OutputSlot,
    scratch_frames: usize,
    event_sender: Sender<Event>,
) -> EngineResult<Stream> {
    let channels = config.channels.max(1) as usize;
    // Rust pattern: `move` closure captures these variables by value
    let mut scratch = vec![SampleFrame::SILENCE; scratch_frames];

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // Real-time audio callback - NO allocations allowed here
                data.fill(0.0);

                let mut guard = slot.lock();
                let Some(pipeline) = guard.as_mut() else {
                    return;
                };

                let frames_needed = data.len() / channels;
                let mut done = 0;
                while done < frames_needed {
                    let want = (frames_needed - done).min(scratch.len());
                    let n = pipeline.pull(&mut scratch[..want]);
                    write_frames(&scratch[..n], &mut data[done * channels..], channels);
                    done += n;
                    if n < want {
                        // Paused or ended: the rest stays silent
                        break;
                    }
                }
            },
            move |err| {
                error!("Output stream error: {}", err);
                let _ = event_sender.try_send(Event::error(err));
            },
            None,
        )
        .map_err(|e| EngineError::StreamBuildError(e.to_string()))
}

/// Spread stereo frames over an interleaved device buffer.
///
/// Mono devices get the downmix; channels past the second are left as they
/// are (already zeroed by the callback).
fn write_frames(frames: &[SampleFrame], data: &mut [f32], channels: usize) {
    for (frame, out) in frames.iter().zip(data.chunks_exact_mut(channels)) {
        if channels == 1 {
            out[0] = frame.downmix();
        } else {
            out[0] = frame.left;
            out[1] = frame.right;
        }
    }
}
