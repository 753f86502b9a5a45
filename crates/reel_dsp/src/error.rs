//! DSP Error Types

use thiserror::Error;

/// Errors that can occur during DSP operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Invalid filter coefficients for frequency {frequency}Hz at sample rate {sample_rate}Hz")]
    InvalidCoefficients { frequency: f32, sample_rate: f32 },

    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("Unknown EQ preset: {0}")]
    UnknownPreset(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DspError::InvalidSampleRate(-1.0);
        assert!(err.to_string().contains("-1"));

        let err = DspError::InvalidCoefficients {
            frequency: 16000.0,
            sample_rate: 22050.0,
        };
        assert!(err.to_string().contains("16000"));
        assert!(err.to_string().contains("22050"));

        let err = DspError::UnknownPreset("Metal".into());
        assert!(err.to_string().contains("Metal"));
    }
}
