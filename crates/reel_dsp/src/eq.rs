//! 10-Band Peaking Equalizer
//!
//! Implements a cascade of BiQuad peaking filters for playback equalization.
//! Based on the RBJ (Robert Bristow-Johnson) Audio EQ Cookbook.
//!
//! Each band reads its gain from a [`SharedGain`] cell that the control plane
//! writes. Coefficients are only recomputed when that gain actually changes,
//! so trigonometry runs at the rate of user adjustment, not the audio rate.

use biquad::{Biquad, Coefficients, DirectForm1};
use tracing::warn;

use crate::error::DspError;
use crate::frame::SampleFrame;
use crate::param::SharedGain;
use crate::processor::FrameProcessor;

/// Number of EQ bands
pub const NUM_EQ_BANDS: usize = 10;

/// Band center frequencies (Hz), in processing order
pub const EQ_BANDS: [f32; NUM_EQ_BANDS] = [
    70.0,    // Sub-bass
    180.0,   // Bass
    320.0,   // Upper bass
    600.0,   // Low-mid
    1000.0,  // Mid
    3000.0,  // Upper-mid
    6000.0,  // Presence
    12000.0, // Brilliance
    14000.0, // High
    16000.0, // Air
];

/// Fixed quality factor for every band
pub const EQ_Q: f32 = 1.4;

/// Lowest band gain accepted by the control surface (dB)
pub const EQ_GAIN_MIN_DB: f32 = -12.0;

/// Highest band gain accepted by the control surface (dB)
pub const EQ_GAIN_MAX_DB: f32 = 12.0;

/// Gains closer to 0 dB than this skip the filter entirely
pub const BYPASS_THRESHOLD_DB: f32 = 0.1;

/// Pass-through coefficients used before the first computation
const UNITY: Coefficients<f32> = Coefficients {
    a1: 0.0,
    a2: 0.0,
    b0: 1.0,
    b1: 0.0,
    b2: 0.0,
};

/// Whether a gain is close enough to 0 dB to bypass the filter
#[inline]
pub fn is_bypass_gain(db: f32) -> bool {
    db.abs() < BYPASS_THRESHOLD_DB
}

fn validate_band(center_hz: f32, sample_rate: f32) -> Result<(), DspError> {
    if !(sample_rate > 0.0) {
        return Err(DspError::InvalidSampleRate(sample_rate));
    }
    if !(center_hz > 0.0) || center_hz >= sample_rate / 2.0 {
        return Err(DspError::InvalidCoefficients {
            frequency: center_hz,
            sample_rate,
        });
    }
    Ok(())
}

/// Peaking EQ coefficients, normalized by a0
///
/// Computed in f64 and stored as f32; the filter itself runs in f32.
pub fn peaking_coefficients(
    center_hz: f32,
    q: f32,
    sample_rate: f32,
    gain_db: f32,
) -> Result<Coefficients<f32>, DspError> {
    validate_band(center_hz, sample_rate)?;

    let a = 10.0_f64.powf(f64::from(gain_db) / 40.0);
    let w0 = 2.0 * std::f64::consts::PI * f64::from(center_hz) / f64::from(sample_rate);
    let (sin_w0, cos_w0) = w0.sin_cos();
    let alpha = sin_w0 / (2.0 * f64::from(q));

    let b0 = 1.0 + alpha * a;
    let b1 = -2.0 * cos_w0;
    let b2 = 1.0 - alpha * a;
    let a0 = 1.0 + alpha / a;
    let a1 = -2.0 * cos_w0;
    let a2 = 1.0 - alpha / a;

    Ok(Coefficients {
        b0: (b0 / a0) as f32,
        b1: (b1 / a0) as f32,
        b2: (b2 / a0) as f32,
        a1: (a1 / a0) as f32,
        a2: (a2 / a0) as f32,
    })
}

/// Last computed coefficients, keyed on the gain they were computed for
#[derive(Debug, Clone, Copy)]
struct CoefficientCache {
    last_gain_db: Option<f32>,
    coeffs: Coefficients<f32>,
    computations: u64,
}

impl CoefficientCache {
    fn new() -> Self {
        Self {
            last_gain_db: None,
            coeffs: UNITY,
            computations: 0,
        }
    }

    #[inline]
    fn is_current(&self, gain_db: f32) -> bool {
        self.last_gain_db == Some(gain_db)
    }

    fn store(&mut self, gain_db: f32, coeffs: Coefficients<f32>) {
        self.last_gain_db = Some(gain_db);
        self.coeffs = coeffs;
        self.computations += 1;
    }
}

/// One peaking filter band with a live gain
///
/// Left and right keep independent direct-form-I history. The history is
/// never reset; filters run continuously for the life of the pipeline.
pub struct BiquadStage {
    center_hz: f32,
    sample_rate: f32,
    gain: SharedGain,
    cache: CoefficientCache,
    left: DirectForm1<f32>,
    right: DirectForm1<f32>,
    /// false when the band sits at or above Nyquist
    realizable: bool,
}

impl BiquadStage {
    pub fn new(center_hz: f32, sample_rate: f32, gain: SharedGain) -> Self {
        let realizable = match validate_band(center_hz, sample_rate) {
            Ok(()) => true,
            Err(e) => {
                warn!("EQ band at {}Hz disabled: {}", center_hz, e);
                false
            }
        };

        Self {
            center_hz,
            sample_rate,
            gain,
            cache: CoefficientCache::new(),
            left: DirectForm1::<f32>::new(UNITY),
            right: DirectForm1::<f32>::new(UNITY),
            realizable,
        }
    }

    pub fn center_hz(&self) -> f32 {
        self.center_hz
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Gain the stage will see on its next frame
    pub fn gain_db(&self) -> f32 {
        self.gain.get()
    }

    /// How many times coefficients have been computed
    pub fn coefficient_updates(&self) -> u64 {
        self.cache.computations
    }

    /// Coefficients currently loaded, if any were ever computed
    pub fn coefficients(&self) -> Option<Coefficients<f32>> {
        self.cache.last_gain_db.map(|_| self.cache.coeffs)
    }

    pub fn is_realizable(&self) -> bool {
        self.realizable
    }

    /// Bring coefficients up to date for `gain_db`.
    ///
    /// Returns false when the filter must not run (bypass gain, a
    /// non-finite gain, or an unrealizable band).
    #[inline]
    fn prepare(&mut self, gain_db: f32) -> bool {
        if !self.realizable || !gain_db.is_finite() || is_bypass_gain(gain_db) {
            return false;
        }
        if self.cache.is_current(gain_db) {
            return true;
        }
        match peaking_coefficients(self.center_hz, EQ_Q, self.sample_rate, gain_db) {
            Ok(coeffs) => {
                self.cache.store(gain_db, coeffs);
                self.left.update_coefficients(coeffs);
                self.right.update_coefficients(coeffs);
                true
            }
            Err(_) => false,
        }
    }

    #[inline]
    fn run(&mut self, frame: SampleFrame) -> SampleFrame {
        SampleFrame {
            left: self.left.run(frame.left),
            right: self.right.run(frame.right),
        }
    }
}

impl FrameProcessor for BiquadStage {
    #[inline]
    fn process(&mut self, frame: SampleFrame) -> SampleFrame {
        let gain_db = self.gain.get();
        if !self.prepare(gain_db) {
            return frame;
        }
        self.run(frame)
    }

    fn process_block(&mut self, frames: &mut [SampleFrame]) {
        let gain_db = self.gain.get();
        if !self.prepare(gain_db) {
            return;
        }
        for frame in frames.iter_mut() {
            *frame = self.run(*frame);
        }
    }

    fn name(&self) -> &'static str {
        "Peaking EQ Band"
    }
}

/// Per-band gains shared by the control surface and every [`EqChain`]
///
/// Cloning shares the underlying cells.
#[derive(Debug, Clone, Default)]
pub struct EqGains {
    bands: [SharedGain; NUM_EQ_BANDS],
}

impl EqGains {
    /// Flat response (all bands at 0 dB)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one band, clamped to [-12, +12] dB
    ///
    /// An index outside 0..10 or a NaN gain is a no-op and returns false.
    pub fn set(&self, index: usize, gain_db: f32) -> bool {
        match self.bands.get(index) {
            Some(band) => band.set_clamped(gain_db, EQ_GAIN_MIN_DB, EQ_GAIN_MAX_DB),
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.bands.get(index).map(SharedGain::get)
    }

    /// Handle to one band's cell
    pub fn band(&self, index: usize) -> Option<SharedGain> {
        self.bands.get(index).cloned()
    }

    /// Copy of all ten gains
    pub fn gains(&self) -> [f32; NUM_EQ_BANDS] {
        core::array::from_fn(|i| self.bands[i].get())
    }

    /// Set every band (each one clamped)
    pub fn set_all(&self, gains: &[f32; NUM_EQ_BANDS]) {
        for (i, &gain) in gains.iter().enumerate() {
            self.set(i, gain);
        }
    }
}

/// Ten peaking bands in series, applied in [`EQ_BANDS`] order
pub struct EqChain {
    stages: [BiquadStage; NUM_EQ_BANDS],
}

impl EqChain {
    pub fn new(sample_rate: f32, gains: &EqGains) -> Self {
        let stages = core::array::from_fn(|i| {
            BiquadStage::new(EQ_BANDS[i], sample_rate, gains.bands[i].clone())
        });
        Self { stages }
    }

    pub fn stages(&self) -> &[BiquadStage; NUM_EQ_BANDS] {
        &self.stages
    }

    /// Total coefficient computations across all bands
    pub fn coefficient_updates(&self) -> u64 {
        self.stages.iter().map(BiquadStage::coefficient_updates).sum()
    }
}

impl FrameProcessor for EqChain {
    #[inline]
    fn process(&mut self, frame: SampleFrame) -> SampleFrame {
        self.stages
            .iter_mut()
            .fold(frame, |frame, stage| stage.process(frame))
    }

    /// Runs each band over the whole block in turn. Every band is LTI over
    /// the block, so this matches per-frame cascading exactly.
    fn process_block(&mut self, frames: &mut [SampleFrame]) {
        for stage in self.stages.iter_mut() {
            stage.process_block(frames);
        }
    }

    fn name(&self) -> &'static str {
        "10-Band Equalizer"
    }
}
