//! Audio Sources
//!
//! A [`FrameSource`] hands out decoded stereo frames on demand. The pipeline
//! pulls from it on the audio thread, so `read` must not block on anything
//! slower than local file I/O.
//!
//! - [`SymphoniaSource`]: streaming packet decoder for files on disk
//! - [`BufferedSource`]: frames already in memory (tests, generated audio)

use std::fs::File;
use std::path::{Path, PathBuf};

use reel_dsp::SampleFrame;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;
use tracing::{debug, warn};

use crate::error::DecodeError;

/// Decoder collaborator: a seekable stream of stereo frames
///
/// Positions and lengths are in frames at the source's own sample rate.
/// Dropping the source releases the underlying file.
pub trait FrameSource: Send {
    /// Fill `out` from the current position. Returns the number of frames
    /// written; 0 means the stream is exhausted.
    fn read(&mut self, out: &mut [SampleFrame]) -> Result<usize, DecodeError>;

    /// Index of the next frame `read` will return
    fn position(&self) -> u64;

    /// Jump to an absolute frame index
    fn seek(&mut self, frame: u64) -> Result<(), DecodeError>;

    /// Total number of frames in the stream
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sample_rate(&self) -> u32;

    /// Channel count of the underlying media (frames are always stereo)
    fn channels(&self) -> u16;
}

/// Frames held in memory
pub struct BufferedSource {
    frames: Vec<SampleFrame>,
    position: usize,
    sample_rate: u32,
    channels: u16,
}

impl BufferedSource {
    pub fn new(frames: Vec<SampleFrame>, sample_rate: u32) -> Self {
        Self {
            frames,
            position: 0,
            sample_rate,
            channels: 2,
        }
    }

    /// Build from interleaved samples. Mono is duplicated to both channels;
    /// channels beyond the second are dropped.
    pub fn from_interleaved(samples: &[f32], channels: u16, sample_rate: u32) -> Self {
        let mut frames = Vec::with_capacity(samples.len() / channels.max(1) as usize);
        push_interleaved(samples, channels.max(1) as usize, &mut frames);
        Self {
            frames,
            position: 0,
            sample_rate,
            channels: channels.max(1),
        }
    }
}

impl FrameSource for BufferedSource {
    fn read(&mut self, out: &mut [SampleFrame]) -> Result<usize, DecodeError> {
        let remaining = &self.frames[self.position..];
        let n = remaining.len().min(out.len());
        out[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }

    fn position(&self) -> u64 {
        self.position as u64
    }

    fn seek(&mut self, frame: u64) -> Result<(), DecodeError> {
        self.position = (frame.min(self.frames.len() as u64)) as usize;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.frames.len() as u64
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }
}

/// Convert interleaved samples into stereo frames
fn push_interleaved(samples: &[f32], channels: usize, out: &mut Vec<SampleFrame>) {
    match channels {
        0 => {}
        1 => out.extend(samples.iter().map(|&s| SampleFrame::mono(s))),
        n => out.extend(
            samples
                .chunks_exact(n)
                .map(|chunk| SampleFrame::new(chunk[0], chunk[1])),
        ),
    }
}

/// Interleaved conversion buffer, reallocated only when a packet outgrows it
struct PcmScratch {
    buf: SampleBuffer<f32>,
    frames: usize,
    channels: usize,
}

/// Streaming decoder for audio files
pub struct SymphoniaSource {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    time_base: Option<TimeBase>,
    sample_rate: u32,
    channels: u16,
    total_frames: u64,
    /// Frames handed out so far (after the last seek)
    position: u64,
    /// Decoded frames not yet handed out
    pending: Vec<SampleFrame>,
    pending_pos: usize,
    /// Frames to discard after an inexact seek
    skip: u64,
    scratch: Option<PcmScratch>,
    exhausted: bool,
}

fn probe(path: &Path) -> Result<Box<dyn FormatReader>, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions {
                enable_gapless: true,
                ..Default::default()
            },
            &MetadataOptions::default(),
        )
        .map_err(|e| match e {
            SymphoniaError::Unsupported(what) => DecodeError::Unsupported(what.to_string()),
            SymphoniaError::IoError(io) => DecodeError::Open {
                path: path.to_path_buf(),
                source: io,
            },
            other => DecodeError::Unsupported(other.to_string()),
        })?;

    Ok(probed.format)
}

fn is_end_of_stream(err: &SymphoniaError) -> bool {
    matches!(err, SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
}

impl SymphoniaSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let mut format = probe(path)?;

        let track = format
            .default_track()
            .filter(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .or_else(|| {
                format
                    .tracks()
                    .iter()
                    .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            })
            .ok_or(DecodeError::NoTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params
            .sample_rate
            .filter(|&sr| sr > 0)
            .ok_or(DecodeError::MissingSampleRate)?;
        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(2)
            .max(1);
        let time_base = codec_params.time_base;

        let total_frames = match codec_params.n_frames {
            Some(n) => n,
            None => {
                // No frame count in the container: walk the packets once and
                // reopen so decoding starts from the top.
                let mut duration_ts = 0u64;
                loop {
                    match format.next_packet() {
                        Ok(packet) if packet.track_id() == track_id => {
                            duration_ts += packet.dur();
                        }
                        Ok(_) => {}
                        Err(ref e) if is_end_of_stream(e) => break,
                        Err(e) => return Err(DecodeError::Stream(e.to_string())),
                    }
                }
                format = probe(path)?;
                ts_to_frames(duration_ts, time_base, sample_rate)
            }
        };

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| match e {
                SymphoniaError::Unsupported(what) => DecodeError::Unsupported(what.to_string()),
                other => DecodeError::Codec(other.to_string()),
            })?;

        debug!(
            "Opened {}: {}Hz, {} channel(s), {} frames",
            path.display(),
            sample_rate,
            channels,
            total_frames
        );

        Ok(Self {
            path: path.to_path_buf(),
            format,
            decoder,
            track_id,
            time_base,
            sample_rate,
            channels,
            total_frames,
            position: 0,
            pending: Vec::new(),
            pending_pos: 0,
            skip: 0,
            scratch: None,
            exhausted: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode packets until at least one frame is pending.
    ///
    /// Returns `Ok(false)` at end of stream. Packets that fail to decode are
    /// skipped.
    fn decode_next(&mut self) -> Result<bool, DecodeError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(ref e) if is_end_of_stream(e) => return Ok(false),
                Err(SymphoniaError::ResetRequired) => return Ok(false),
                Err(e) => return Err(DecodeError::Stream(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(msg)) => {
                    warn!("Skipping undecodable packet in {}: {}", self.path.display(), msg);
                    continue;
                }
                Err(ref e) if is_end_of_stream(e) => return Ok(false),
                Err(e) => return Err(DecodeError::Codec(e.to_string())),
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity();
            let channels = spec.channels.count();

            let scratch = match self.scratch.take() {
                Some(s) if s.frames >= capacity && s.channels == channels => s,
                _ => PcmScratch {
                    buf: SampleBuffer::<f32>::new(capacity as u64, spec),
                    frames: capacity,
                    channels,
                },
            };
            let scratch = self.scratch.insert(scratch);
            scratch.buf.copy_interleaved_ref(decoded);

            self.pending.clear();
            self.pending_pos = 0;
            push_interleaved(scratch.buf.samples(), channels, &mut self.pending);

            if self.skip > 0 {
                let dropped = (self.skip as usize).min(self.pending.len());
                self.pending_pos = dropped;
                self.skip -= dropped as u64;
            }

            if self.pending_pos < self.pending.len() {
                return Ok(true);
            }
        }
    }
}

/// Timestamp units to frames at `sample_rate`
fn ts_to_frames(ts: u64, time_base: Option<TimeBase>, sample_rate: u32) -> u64 {
    match time_base {
        Some(tb) if tb.denom > 0 => {
            let frames =
                ts as u128 * tb.numer as u128 * sample_rate as u128 / tb.denom as u128;
            frames as u64
        }
        _ => ts,
    }
}

/// Frames at `sample_rate` to timestamp units
fn frames_to_ts(frames: u64, time_base: Option<TimeBase>, sample_rate: u32) -> u64 {
    match time_base {
        Some(tb) if tb.numer > 0 && sample_rate > 0 => {
            let ts = frames as u128 * tb.denom as u128 / (tb.numer as u128 * sample_rate as u128);
            ts as u64
        }
        _ => frames,
    }
}

impl FrameSource for SymphoniaSource {
    fn read(&mut self, out: &mut [SampleFrame]) -> Result<usize, DecodeError> {
        let mut written = 0;

        while written < out.len() {
            let available = self.pending.len() - self.pending_pos;
            if available > 0 {
                let n = available.min(out.len() - written);
                out[written..written + n]
                    .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
                written += n;
                self.pending_pos += n;
                continue;
            }

            if self.exhausted {
                break;
            }

            match self.decode_next() {
                Ok(true) => {}
                Ok(false) => self.exhausted = true,
                Err(e) => {
                    self.exhausted = true;
                    if written == 0 {
                        return Err(e);
                    }
                    warn!("Ending {} early: {}", self.path.display(), e);
                    break;
                }
            }
        }

        self.position += written as u64;
        Ok(written)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, frame: u64) -> Result<(), DecodeError> {
        let frame = frame.min(self.total_frames);
        let ts = frames_to_ts(frame, self.time_base, self.sample_rate);

        let seeked = self
            .format
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts,
                    track_id: self.track_id,
                },
            )
            .map_err(|e| DecodeError::Seek(e.to_string()))?;

        self.decoder.reset();
        self.pending.clear();
        self.pending_pos = 0;
        self.exhausted = false;

        let required = ts_to_frames(seeked.required_ts, self.time_base, self.sample_rate);
        let actual = ts_to_frames(seeked.actual_ts, self.time_base, self.sample_rate);
        self.skip = required.saturating_sub(actual);
        self.position = required;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.total_frames
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }
}
