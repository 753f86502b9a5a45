//! Output Devices
//!
//! - Enumeration of the host's output devices (via CPAL)
//! - [`OutputDevice`]: what the player needs from a device
//! - [`OutputSlot`]: the device's single pipeline claim and its scoped lock
//! - [`NullOutput`]: an offline device rendered on demand

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait};
use parking_lot::{Mutex, MutexGuard};
use reel_dsp::SampleFrame;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::pipeline::Pipeline;

/// Describes an output device on the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Human-readable device name (CPAL doesn't provide separate IDs)
    pub name: String,

    /// Whether this is the system default device
    pub is_default: bool,

    /// Supported sample rates (may be empty if querying failed)
    pub sample_rates: Vec<u32>,

    /// Maximum supported channels
    pub max_channels: u16,
}

impl AudioDevice {
    /// Enumerate all output devices
    pub fn enumerate_outputs() -> EngineResult<Vec<AudioDevice>> {
        let host = cpal::default_host();

        let default_name = host
            .default_output_device()
            .and_then(|d| d.name().ok());

        let devices: Vec<AudioDevice> = host
            .output_devices()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?
            .filter_map(|device| Self::from_cpal_device(&device, default_name.as_deref()).ok())
            .collect();

        if devices.is_empty() {
            return Err(EngineError::NoDevicesFound);
        }

        Ok(devices)
    }

    /// Get the default output device
    pub fn default_output() -> EngineResult<AudioDevice> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoDevicesFound)?;

        Self::from_cpal_device(&device, None).map(|mut d| {
            d.is_default = true;
            d
        })
    }

    /// Create AudioDevice from CPAL device
    fn from_cpal_device(device: &cpal::Device, default_name: Option<&str>) -> EngineResult<Self> {
        let name = device
            .name()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?;

        let is_default = default_name.map(|d| d == name).unwrap_or(false);

        let (sample_rates, max_channels) = match device.supported_output_configs() {
            Ok(configs) => Self::extract_config_info(configs),
            Err(_) => (vec![], 2),
        };

        Ok(AudioDevice {
            name,
            is_default,
            sample_rates,
            max_channels,
        })
    }

    fn extract_config_info(
        configs: impl Iterator<Item = cpal::SupportedStreamConfigRange>,
    ) -> (Vec<u32>, u16) {
        let mut sample_rates = Vec::new();
        let mut max_channels = 0u16;

        // Common sample rates to check
        const COMMON_RATES: [u32; 7] = [22050, 44100, 48000, 88200, 96000, 176400, 192000];

        for config in configs {
            max_channels = max_channels.max(config.channels());

            let min = config.min_sample_rate().0;
            let max = config.max_sample_rate().0;

            for &rate in &COMMON_RATES {
                if rate >= min && rate <= max && !sample_rates.contains(&rate) {
                    sample_rates.push(rate);
                }
            }
        }

        sample_rates.sort_unstable();
        (sample_rates, max_channels)
    }
}

/// Look up a CPAL output device by name, or the default when `name` is None
pub(crate) fn find_output(name: Option<&str>) -> EngineResult<cpal::Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_output_device()
            .ok_or(EngineError::NoDevicesFound),
        Some(wanted) => host
            .output_devices()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| EngineError::DeviceNotFound(wanted.to_string())),
    }
}

/// The pipeline currently claimed by a device
///
/// The mutex is the device's scoped lock: the audio callback holds it for
/// one pull, the control plane for structural changes. Clones share the slot.
#[derive(Clone, Default)]
pub struct OutputSlot {
    inner: Arc<Mutex<Option<Pipeline>>>,
}

impl OutputSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `pipeline`. The previous claim is swapped out under the lock
    /// and dropped after it is released.
    pub fn claim(&self, pipeline: Pipeline) {
        let previous = self.inner.lock().replace(pipeline);
        drop(previous);
    }

    /// Detach the claimed pipeline. The caller owns it once the lock is
    /// released, so dropping it never stalls the audio callback.
    pub fn take(&self) -> Option<Pipeline> {
        self.inner.lock().take()
    }

    /// Release the claimed pipeline. Returns whether there was one.
    pub fn clear(&self) -> bool {
        let previous = self.take();
        previous.is_some()
    }

    /// Scoped lock over the claimed pipeline
    pub fn lock(&self) -> MutexGuard<'_, Option<Pipeline>> {
        self.inner.lock()
    }

    pub fn is_claimed(&self) -> bool {
        self.inner.lock().is_some()
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Pull frames from the claimed pipeline. Returns 0 when nothing is
    /// claimed.
    pub fn render(&self, out: &mut [SampleFrame]) -> usize {
        match self.inner.lock().as_mut() {
            Some(pipeline) => pipeline.pull(out),
            None => 0,
        }
    }
}

/// Output-device collaborator used by the player
///
/// The device pulls from its slot on its own schedule.
pub trait OutputDevice {
    /// Rate the device consumes frames at
    fn sample_rate(&self) -> u32;

    fn slot(&self) -> &OutputSlot;

    fn name(&self) -> &str {
        "output"
    }
}

/// A device with no hardware behind it
///
/// Nothing pulls automatically; call [`OutputSlot::render`] on a clone of
/// its slot to advance playback.
pub struct NullOutput {
    sample_rate: u32,
    slot: OutputSlot,
}

impl NullOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            slot: OutputSlot::new(),
        }
    }
}

impl OutputDevice for NullOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn slot(&self) -> &OutputSlot {
        &self.slot
    }

    fn name(&self) -> &str {
        "null"
    }
}
