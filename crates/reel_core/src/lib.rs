//! Reel Core - Playback Engine
//!
//! This crate provides the playback side of Reel, including:
//! - Streaming decode of audio files (via Symphonia)
//! - Sample-rate conversion when the file and device disagree (via Rubato)
//! - The per-track processing pipeline and its pause/end-of-stream gate
//! - Output device enumeration and stream management (via CPAL)
//! - The [`Player`] control surface used by the UI thread
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        UI Thread                            │
//! │  (CLI/UI) ──calls──▶ Player ◀──events── (crossbeam-channel) │
//! └─────────────────────────────────────────────────────────────┘
//!              │ atomics (volume, EQ)   │ slot lock (transport)
//!              ▼                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │  Decoder ─▶ Resampler ─▶ EQ ─▶ Gain ─▶ Tap ─▶ Gate ─▶ Out   │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod decoder;
mod device;
mod error;
mod message;
mod pipeline;
mod player;
mod resample;
mod stream;

pub use config::{OutputConfig, PlayerConfig, ResamplerConfig};
pub use decoder::{BufferedSource, FrameSource, SymphoniaSource};
pub use device::{AudioDevice, NullOutput, OutputDevice, OutputSlot};
pub use error::{DecodeError, EngineError, EngineResult};
pub use message::Event;
pub use pipeline::{PlaybackGate, Pipeline};
pub use player::{PlaybackState, Player};
pub use resample::StreamResampler;
pub use stream::CpalOutput;

// Re-export DSP types for convenience
pub use reel_dsp::{
    SampleFrame, SpectrumAnalyzer, EQ_BANDS, FFT_SIZE, NUM_EQ_BANDS, NUM_SPECTRUM_BANDS, PRESETS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let _config = PlayerConfig::default();
        let device = NullOutput::new(44100);
        let player = Player::new(PlayerConfig::default(), Box::new(device)).unwrap();
        assert_eq!(player.output_sample_rate(), 44100);
        assert_eq!(player.eq_bands(), [0.0; NUM_EQ_BANDS]);
    }

    #[test]
    fn test_spectrum_from_player_snapshot() {
        let device = NullOutput::new(44100);
        let slot = device.slot().clone();
        let player = Player::new(PlayerConfig::default(), Box::new(device)).unwrap();

        let frames = (0..44100)
            .map(|i| {
                let t = i as f32 / 44100.0;
                SampleFrame::mono((2.0 * std::f32::consts::PI * 1000.0 * t).sin() * 0.5)
            })
            .collect();
        player
            .load_source(Box::new(BufferedSource::new(frames, 44100)))
            .unwrap();
        player.play();

        let mut out = vec![SampleFrame::SILENCE; 4096];
        slot.render(&mut out);

        let mut analyzer = SpectrumAnalyzer::new(player.output_sample_rate() as f32);
        let levels = analyzer.analyze(&player.sample_snapshot(FFT_SIZE));
        let loudest = levels
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(loudest, Some(4));
    }
}
