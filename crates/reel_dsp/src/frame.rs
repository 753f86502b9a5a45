//! Stereo sample frame, the unit that flows through every stage.

/// One sample per channel at a single instant.
///
/// Amplitudes are nominally in [-1, 1] but are never hard-clamped here;
/// boosts can push them past full scale and the output device decides.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleFrame {
    pub left: f32,
    pub right: f32,
}

impl SampleFrame {
    pub const SILENCE: SampleFrame = SampleFrame {
        left: 0.0,
        right: 0.0,
    };

    #[inline]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Same sample on both channels (mono sources)
    #[inline]
    pub const fn mono(sample: f32) -> Self {
        Self {
            left: sample,
            right: sample,
        }
    }

    /// Mono downmix used by the visualization tap
    #[inline]
    pub fn downmix(self) -> f32 {
        (self.left + self.right) / 2.0
    }

    #[inline]
    pub fn scale(self, gain: f32) -> Self {
        Self {
            left: self.left * gain,
            right: self.right * gain,
        }
    }
}
