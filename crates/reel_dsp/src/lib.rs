//! Reel DSP - Digital Signal Processing Module
//!
//! This crate provides the per-frame processing stages for Reel, including:
//! - 10-band peaking equalizer using BiQuad filters
//! - Master gain stage driven by a live dB value
//! - Visualization tap with a lock-free sample history
//! - FFT spectrum analyzer for UI-rate band levels
//!
//! # Architecture
//!
//! The processing chain follows a strict "no allocation in audio callback" rule.
//! Live parameters (band gains, volume) are atomic f32 cells written by the
//! control plane and read by the audio thread once per block. Filter
//! coefficients are recomputed only when a band's gain actually changes.

mod eq;
mod error;
mod fft;
mod frame;
mod gain;
mod param;
mod presets;
mod processor;
mod tap;

pub use eq::{
    is_bypass_gain, peaking_coefficients, BiquadStage, EqChain, EqGains, BYPASS_THRESHOLD_DB,
    EQ_BANDS, EQ_GAIN_MAX_DB, EQ_GAIN_MIN_DB, EQ_Q, NUM_EQ_BANDS,
};
pub use error::DspError;
pub use fft::{SpectrumAnalyzer, FFT_SIZE, NUM_SPECTRUM_BANDS, SPECTRUM_BAND_EDGES};
pub use frame::SampleFrame;
pub use gain::{GainStage, VOLUME_MAX_DB, VOLUME_MIN_DB};
pub use param::{db_to_linear, SharedGain};
pub use presets::{preset, Preset, PRESETS};
pub use processor::{FrameProcessor, ProcessorChain};
pub use tap::{TapBuffer, VisualizationTap, TAP_CAPACITY};
