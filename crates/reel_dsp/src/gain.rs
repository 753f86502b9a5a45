//! Master volume stage

use crate::frame::SampleFrame;
use crate::param::{db_to_linear, SharedGain};
use crate::processor::FrameProcessor;

/// Quietest volume the control surface accepts (dB)
pub const VOLUME_MIN_DB: f32 = -30.0;

/// Loudest volume the control surface accepts (dB)
pub const VOLUME_MAX_DB: f32 = 6.0;

/// Scales both channels by the linear equivalent of a live dB value.
///
/// The range is enforced where the value is written, not here.
pub struct GainStage {
    volume: SharedGain,
}

impl GainStage {
    pub fn new(volume: SharedGain) -> Self {
        Self { volume }
    }

    /// Linear factor for the current volume
    #[inline]
    pub fn linear_gain(&self) -> f32 {
        db_to_linear(self.volume.get())
    }
}

impl FrameProcessor for GainStage {
    #[inline]
    fn process(&mut self, frame: SampleFrame) -> SampleFrame {
        frame.scale(self.linear_gain())
    }

    fn process_block(&mut self, frames: &mut [SampleFrame]) {
        let gain = self.linear_gain();
        for frame in frames.iter_mut() {
            *frame = frame.scale(gain);
        }
    }

    fn name(&self) -> &'static str {
        "Gain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unity_at_zero_db() {
        let mut stage = GainStage::new(SharedGain::new(0.0));
        let frame = SampleFrame::new(0.3, -0.7);
        assert_eq!(stage.process(frame), frame);
    }

    #[test]
    fn test_attenuation() {
        let mut stage = GainStage::new(SharedGain::new(-20.0));
        let out = stage.process(SampleFrame::new(1.0, -1.0));
        assert!((out.left - 0.1).abs() < 1e-5);
        assert!((out.right + 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_reads_volume_every_block() {
        let volume = SharedGain::new(0.0);
        let mut stage = GainStage::new(volume.clone());

        let mut block = [SampleFrame::mono(0.5); 4];
        stage.process_block(&mut block);
        assert_eq!(block[0], SampleFrame::mono(0.5));

        volume.set(6.0);
        stage.process_block(&mut block);
        assert!((block[3].left - 0.5 * db_to_linear(6.0)).abs() < 1e-6);
    }

    #[test]
    fn test_volume_range() {
        assert!(VOLUME_MIN_DB < 0.0);
        assert!(VOLUME_MAX_DB > 0.0);
        assert!(db_to_linear(VOLUME_MIN_DB) > 0.0);
    }
}
