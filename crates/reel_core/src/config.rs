//! Player, Output and Resampler Configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Output stream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of device channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Buffer size hint in frames (lower = less latency, higher = more stability)
    pub buffer_size: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            // 100ms at 44.1kHz
            buffer_size: 4410,
        }
    }
}

impl OutputConfig {
    /// Calculate latency in milliseconds for this configuration
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate < 8000 || self.sample_rate > 192000 {
            return Err(format!("Invalid sample rate: {}", self.sample_rate));
        }
        if self.channels == 0 || self.channels > 8 {
            return Err(format!("Invalid channel count: {}", self.channels));
        }
        if self.buffer_size < 32 || self.buffer_size > 16384 {
            return Err(format!("Invalid buffer size: {}", self.buffer_size));
        }
        Ok(())
    }
}

/// Sinc resampler parameters, used when a source's rate differs from the device's
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResamplerConfig {
    /// Sinc interpolation length in taps
    pub sinc_len: usize,

    /// Input frames consumed per resampler pass
    pub chunk_size: usize,

    /// Cutoff relative to the lower Nyquist (0.0 - 1.0)
    pub f_cutoff: f32,

    /// Sinc table oversampling
    pub oversampling_factor: usize,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            sinc_len: 64,
            chunk_size: 1024,
            f_cutoff: 0.95,
            oversampling_factor: 128,
        }
    }
}

impl ResamplerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sinc_len < 8 || self.sinc_len > 1024 {
            return Err(format!("Invalid sinc length: {}", self.sinc_len));
        }
        if self.chunk_size < 64 || self.chunk_size > 16384 {
            return Err(format!("Invalid resampler chunk size: {}", self.chunk_size));
        }
        if !(self.f_cutoff > 0.0 && self.f_cutoff <= 1.0) {
            return Err(format!("Invalid resampler cutoff: {}", self.f_cutoff));
        }
        if self.oversampling_factor == 0 {
            return Err("Resampler oversampling factor must be positive".to_string());
        }
        Ok(())
    }
}

/// Overall player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Output stream configuration
    pub output: OutputConfig,

    /// Resampler used on sample-rate mismatch
    pub resampler: ResamplerConfig,

    /// Visualization history length in samples (at least one FFT window)
    pub tap_capacity: usize,

    /// Volume applied before the first `set_volume`, in dB
    pub initial_volume_db: f32,

    /// Capacity of the event channel; events beyond it are dropped
    pub event_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            resampler: ResamplerConfig::default(),
            tap_capacity: reel_dsp::TAP_CAPACITY,
            initial_volume_db: 0.0,
            event_capacity: 64,
        }
    }
}

impl PlayerConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::ConfigError(e.to_string()))?;
        config.validate().map_err(EngineError::ConfigError)?;
        Ok(config)
    }

    /// Read and parse a JSON config file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| EngineError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.output.validate()?;
        self.resampler.validate()?;
        if self.tap_capacity < reel_dsp::FFT_SIZE {
            return Err(format!(
                "Tap capacity {} is smaller than the FFT window ({})",
                self.tap_capacity,
                reel_dsp::FFT_SIZE
            ));
        }
        if !self.initial_volume_db.is_finite() {
            return Err(format!("Invalid initial volume: {}", self.initial_volume_db));
        }
        if self.event_capacity == 0 {
            return Err("Event capacity must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OutputConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channels, 2);
        assert_eq!(config.buffer_size, 4410);
        assert!(PlayerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_latency_calculation() {
        let config = OutputConfig {
            sample_rate: 48000,
            channels: 2,
            buffer_size: 480, // Exactly 10ms at 48kHz
        };
        let latency = config.latency_ms();
        assert!((latency - 10.0).abs() < 0.01);
        assert!((OutputConfig::default().latency_ms() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_validation() {
        let valid = OutputConfig::default();
        assert!(valid.validate().is_ok());

        let invalid_rate = OutputConfig {
            sample_rate: 100,
            ..Default::default()
        };
        assert!(invalid_rate.validate().is_err());

        let invalid_channels = OutputConfig {
            channels: 0,
            ..Default::default()
        };
        assert!(invalid_channels.validate().is_err());

        let invalid_buffer = OutputConfig {
            buffer_size: 10,
            ..Default::default()
        };
        assert!(invalid_buffer.validate().is_err());

        let small_tap = PlayerConfig {
            tap_capacity: 512,
            ..Default::default()
        };
        assert!(small_tap.validate().is_err());

        let bad_cutoff = ResamplerConfig {
            f_cutoff: 1.5,
            ..Default::default()
        };
        assert!(bad_cutoff.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = PlayerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized = PlayerConfig::from_json_str(&json).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            PlayerConfig::from_json_str(r#"{ "output": { "sample_rate": 48000 } }"#).unwrap();
        assert_eq!(config.output.sample_rate, 48000);
        assert_eq!(config.output.buffer_size, 4410);
        assert_eq!(config.resampler, ResamplerConfig::default());
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = PlayerConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::ConfigError(_)));

        let err = PlayerConfig::from_json_str(r#"{ "output": { "channels": 0 } }"#).unwrap_err();
        assert!(matches!(err, EngineError::ConfigError(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PlayerConfig::load("/nonexistent/reel.json").unwrap_err();
        assert!(err.to_string().contains("reel.json"));
    }
}
