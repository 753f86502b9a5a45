//! Streaming sample-rate conversion
//!
//! Sits between a [`FrameSource`] and the processing chain when the source
//! rate differs from the device rate. Buffers are sized once at construction;
//! a pull never allocates.

use reel_dsp::SampleFrame;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use crate::config::ResamplerConfig;
use crate::decoder::FrameSource;
use crate::error::{DecodeError, EngineError, EngineResult};

const CHANNELS: usize = 2;

/// Band-limited sinc resampler over a pulled stereo stream
pub struct StreamResampler {
    inner: SincFixedIn<f32>,
    from_rate: u32,
    to_rate: u32,
    /// Planar input, one chunk per channel
    input: Vec<Vec<f32>>,
    /// Planar output of the last pass
    output: Vec<Vec<f32>>,
    out_pos: usize,
    out_len: usize,
    read_buf: Vec<SampleFrame>,
    /// Leading output frames still to discard (filter delay)
    delay_remaining: usize,
    input_total: u64,
    emitted: u64,
    source_done: bool,
    finished: bool,
}

fn build(from_rate: u32, to_rate: u32, config: &ResamplerConfig) -> EngineResult<SincFixedIn<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(EngineError::ResamplerError(format!(
            "cannot resample {}Hz -> {}Hz",
            from_rate, to_rate
        )));
    }
    let params = SincInterpolationParameters {
        sinc_len: config.sinc_len,
        f_cutoff: config.f_cutoff,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: config.oversampling_factor,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = to_rate as f64 / from_rate as f64;
    SincFixedIn::<f32>::new(ratio, 1.0, params, config.chunk_size, CHANNELS)
        .map_err(|e| EngineError::ResamplerError(e.to_string()))
}

impl StreamResampler {
    pub fn new(from_rate: u32, to_rate: u32, config: &ResamplerConfig) -> EngineResult<Self> {
        let inner = build(from_rate, to_rate, config)?;
        let chunk = inner.input_frames_max();
        let out_max = inner.output_frames_max();
        let delay = inner.output_delay();

        debug!(
            "Resampler {}Hz -> {}Hz (chunk {}, delay {} frames)",
            from_rate, to_rate, chunk, delay
        );

        Ok(Self {
            inner,
            from_rate,
            to_rate,
            input: vec![vec![0.0; chunk]; CHANNELS],
            output: vec![vec![0.0; out_max]; CHANNELS],
            out_pos: 0,
            out_len: 0,
            read_buf: vec![SampleFrame::SILENCE; chunk],
            delay_remaining: delay,
            input_total: 0,
            emitted: 0,
            source_done: false,
            finished: false,
        })
    }

    pub fn from_rate(&self) -> u32 {
        self.from_rate
    }

    pub fn to_rate(&self) -> u32 {
        self.to_rate
    }

    /// Discard filter history and buffered output, keeping the sinc table
    /// and every buffer. Does not allocate.
    pub fn reset(&mut self) {
        self.inner.reset();
        self.out_pos = 0;
        self.out_len = 0;
        self.delay_remaining = self.inner.output_delay();
        self.input_total = 0;
        self.emitted = 0;
        self.source_done = false;
        self.finished = false;
    }

    /// Output frames expected for everything read from the source so far
    fn expected_output(&self) -> u64 {
        let num = self.input_total as u128 * self.to_rate as u128;
        let den = self.from_rate as u128;
        ((num + den - 1) / den) as u64
    }

    /// Run one resampler pass. Returns false once the stream is drained.
    fn refill(&mut self, source: &mut dyn FrameSource) -> Result<bool, DecodeError> {
        if self.finished {
            return Ok(false);
        }

        let needed = self.inner.input_frames_next();
        let mut got = 0;
        while !self.source_done && got < needed {
            let n = source.read(&mut self.read_buf[got..needed])?;
            if n == 0 {
                self.source_done = true;
            }
            got += n;
        }
        self.input_total += got as u64;

        if self.source_done && got == 0 && self.emitted >= self.expected_output() {
            self.finished = true;
            return Ok(false);
        }

        let (left, right) = self.input.split_at_mut(1);
        for (i, frame) in self.read_buf[..got].iter().enumerate() {
            left[0][i] = frame.left;
            right[0][i] = frame.right;
        }
        // Zero-pad a short final chunk (and the flush passes after it)
        left[0][got..needed].fill(0.0);
        right[0][got..needed].fill(0.0);

        let (_, written) = self
            .inner
            .process_into_buffer(&self.input, &mut self.output, None)
            .map_err(|e| DecodeError::Stream(format!("resampler: {}", e)))?;

        self.out_pos = 0;
        self.out_len = written;

        if self.delay_remaining > 0 {
            let dropped = self.delay_remaining.min(written);
            self.out_pos = dropped;
            self.delay_remaining -= dropped;
        }

        if self.source_done {
            let room = self.expected_output().saturating_sub(self.emitted) as usize;
            if self.out_len - self.out_pos > room {
                self.out_len = self.out_pos + room;
            }
            if room == 0 {
                self.finished = true;
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Fill `out` with resampled frames pulled from `source`.
    ///
    /// Returns fewer frames than requested only once the source is
    /// exhausted and the filter tail has been flushed.
    pub fn pull(
        &mut self,
        source: &mut dyn FrameSource,
        out: &mut [SampleFrame],
    ) -> Result<usize, DecodeError> {
        let mut written = 0;

        while written < out.len() {
            if self.out_pos < self.out_len {
                let n = (self.out_len - self.out_pos).min(out.len() - written);
                for (i, frame) in out[written..written + n].iter_mut().enumerate() {
                    let idx = self.out_pos + i;
                    *frame = SampleFrame::new(self.output[0][idx], self.output[1][idx]);
                }
                self.out_pos += n;
                written += n;
                self.emitted += n as u64;
                continue;
            }

            if !self.refill(source)? {
                break;
            }
        }

        Ok(written)
    }
}
