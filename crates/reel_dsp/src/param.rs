//! Lock-free decibel parameters shared between the control plane and the
//! audio thread.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A decibel value that one thread writes and the audio thread reads.
///
/// Stored as `f32` bits in an `AtomicU32` (there is no `AtomicF32`), so a
/// reader never sees a torn value. Readers may observe a value at most one
/// write behind, which is fine for parameters applied per buffer.
///
/// Cloning shares the same cell.
#[derive(Debug, Clone)]
pub struct SharedGain {
    bits: Arc<AtomicU32>,
}

impl SharedGain {
    pub fn new(db: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(db.to_bits())),
        }
    }

    /// Current value in dB
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Store a value as-is. Range policy belongs to the caller.
    #[inline]
    pub fn set(&self, db: f32) {
        self.bits.store(db.to_bits(), Ordering::Relaxed);
    }

    /// Store `db` clamped to `[min, max]`. NaN is ignored and returns `false`.
    pub fn set_clamped(&self, db: f32, min: f32, max: f32) -> bool {
        if db.is_nan() {
            return false;
        }
        self.set(db.clamp(min, max));
        true
    }
}

impl Default for SharedGain {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}
