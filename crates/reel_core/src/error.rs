//! Engine Error Types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while opening or reading an audio source
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported audio format: {0}")]
    Unsupported(String),

    #[error("No playable audio track found")]
    NoTrack,

    #[error("Audio track does not declare a sample rate")]
    MissingSampleRate,

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Seek failed: {0}")]
    Seek(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

/// Errors that can occur in the playback engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No audio devices found")]
    NoDevicesFound,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    #[error("Failed to play audio stream: {0}")]
    StreamPlayError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Resampler error: {0}")]
    ResamplerError(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("DSP error: {0}")]
    DspError(#[from] reel_dsp::DspError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
