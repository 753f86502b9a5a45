//! FFT Spectrum Analyzer
//!
//! Turns a snapshot of recent samples into ten smoothed band levels for
//! display. Runs on the UI thread at timer rate, never on the audio thread.
//!
//! # Pipeline
//!
//! 1. Zero-fill a 2048-point window and copy up to 2048 samples into it
//! 2. Apply a Hann window
//! 3. Forward FFT (planned once, scratch reused)
//! 4. Average magnitudes per band, map to a 0..1 dB-like scale
//! 5. Smooth against the previous frame (fast attack, slow decay)

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// FFT size (must be power of 2)
/// 2048 samples at 44.1kHz = ~46ms window, ~21.5Hz resolution
pub const FFT_SIZE: usize = 2048;

/// Number of output bands
pub const NUM_SPECTRUM_BANDS: usize = 10;

/// Band edges (Hz); band `b` spans `[edges[b], edges[b + 1]]`
pub const SPECTRUM_BAND_EDGES: [f32; NUM_SPECTRUM_BANDS + 1] = [
    20.0, 100.0, 200.0, 400.0, 800.0, 1600.0, 3200.0, 6400.0, 12800.0, 16000.0, 20000.0,
];

/// Multiplier applied to every level when there is nothing to analyze
const IDLE_DECAY: f32 = 0.8;

/// Weight of the new value when a band rises
const ATTACK: f32 = 0.6;

/// Weight of the new value when a band holds or falls
const RELEASE: f32 = 0.25;

fn hann_window(n: usize, size: usize) -> f32 {
    0.5 * (1.0 - (2.0 * std::f32::consts::PI * n as f32 / (size - 1) as f32).cos())
}

/// Pre-computed Hann window lookup table
struct HannWindow {
    coeffs: [f32; FFT_SIZE],
}

impl HannWindow {
    fn new() -> Self {
        let coeffs = core::array::from_fn(|i| hann_window(i, FFT_SIZE));
        Self { coeffs }
    }

    #[inline]
    fn apply(&self, sample: f32, index: usize) -> f32 {
        sample * self.coeffs[index]
    }
}

/// Inclusive FFT bin range for each band at a given sample rate
fn band_bins(sample_rate: f32) -> [(usize, usize); NUM_SPECTRUM_BANDS] {
    let bin_hz = sample_rate / FFT_SIZE as f32;
    let top = FFT_SIZE / 2 - 1;
    core::array::from_fn(|b| {
        let lo = ((SPECTRUM_BAND_EDGES[b] / bin_hz) as usize).max(1);
        let hi = ((SPECTRUM_BAND_EDGES[b + 1] / bin_hz) as usize).min(top);
        (lo, hi)
    })
}

/// Map a mean FFT magnitude onto 0..1
#[inline]
fn magnitude_to_level(mean: f32) -> f32 {
    if mean > 0.0 {
        ((20.0 * mean.log10() + 10.0) / 50.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Stateful band analyzer
///
/// Smoothing state lives for as long as the analyzer, across track changes.
pub struct SpectrumAnalyzer {
    sample_rate: f32,
    bins: [(usize, usize); NUM_SPECTRUM_BANDS],
    window: HannWindow,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Last smoothed levels
    prev: [f32; NUM_SPECTRUM_BANDS],
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            sample_rate,
            bins: band_bins(sample_rate),
            window: HannWindow::new(),
            fft,
            buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            scratch,
            prev: [0.0; NUM_SPECTRUM_BANDS],
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current smoothed levels, each in [0, 1]
    pub fn levels(&self) -> [f32; NUM_SPECTRUM_BANDS] {
        self.prev
    }

    /// Analyze up to [`FFT_SIZE`] samples and return the smoothed levels.
    ///
    /// Empty input decays every level by 0.8 instead. Extra samples beyond
    /// the window are ignored.
    pub fn analyze(&mut self, samples: &[f32]) -> [f32; NUM_SPECTRUM_BANDS] {
        if samples.is_empty() {
            for level in self.prev.iter_mut() {
                *level *= IDLE_DECAY;
            }
            return self.prev;
        }

        self.buffer.fill(Complex::new(0.0, 0.0));
        for (i, (slot, &sample)) in self.buffer.iter_mut().zip(samples).enumerate() {
            *slot = Complex::new(self.window.apply(sample, i), 0.0);
        }
        // Zero-padded tail stays zero after windowing

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (b, &(lo, hi)) in self.bins.iter().enumerate() {
            let mean = if lo <= hi {
                let sum: f32 = self.buffer[lo..=hi].iter().map(|c| c.norm()).sum();
                sum / (hi - lo + 1) as f32
            } else {
                0.0
            };
            let level = magnitude_to_level(mean);

            let old = self.prev[b];
            self.prev[b] = if level > old {
                level * ATTACK + old * (1.0 - ATTACK)
            } else {
                level * RELEASE + old * (1.0 - RELEASE)
            };
        }

        self.prev
    }

    /// Forget smoothing history
    pub fn reset(&mut self) {
        self.prev = [0.0; NUM_SPECTRUM_BANDS];
    }
}
