//! Built-in EQ Presets

use crate::eq::NUM_EQ_BANDS;
use crate::error::DspError;

/// Named EQ preset with 10 band gains
pub type Preset = (&'static str, [f32; NUM_EQ_BANDS]);

/// List of built-in presets
///
/// Bands: 70, 180, 320, 600, 1k, 3k, 6k, 12k, 14k, 16k
pub const PRESETS: &[Preset] = &[
    ("Flat", [0.0; NUM_EQ_BANDS]),
    ("Bass Boost", [6.0, 5.0, 3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
    ("Treble Boost", [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 3.0, 5.0, 6.0, 6.0]),
    ("Vocal", [-2.0, -1.0, 0.0, 2.0, 4.0, 4.0, 3.0, 1.0, 0.0, -1.0]),
    ("Loudness", [4.0, 3.0, 0.0, -1.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0]),
    ("Electronic", [4.0, 3.0, 1.0, 0.0, -2.0, -2.0, 0.0, 1.0, 3.0, 4.0]),
    ("Acoustic", [3.0, 2.0, 1.0, 0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0]),
];

/// Look up a preset by name (case-insensitive)
pub fn preset(name: &str) -> Result<&'static [f32; NUM_EQ_BANDS], DspError> {
    PRESETS
        .iter()
        .find(|(preset_name, _)| preset_name.eq_ignore_ascii_case(name))
        .map(|(_, gains)| gains)
        .ok_or_else(|| DspError::UnknownPreset(name.to_string()))
}
