use cpal::traits::{DeviceTrait, HostTrait};
use micswitch_audio_core::{AudioError, AudioSystemClient, DeviceId, RawDevice, RawSnapshot};

#[derive(Default)]
pub struct WasapiClient;

impl WasapiClient {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSystemClient for WasapiClient {
    fn backend_name(&self) -> &'static str {
        "wasapi"
    }

    fn query(&self) -> Result<RawSnapshot, AudioError> {
        let host = cpal::default_host();

        let default_id = host
            .default_input_device()
            .and_then(|d| d.name().ok())
            .map(DeviceId::new);

        let input_devices = host
            .input_devices()
            .map_err(|e| AudioError::unavailable(format!("Failed to enumerate input devices: {}", e)))?;

        let mut devices = Vec::new();
        for device in input_devices {
            match device.name() {
                Ok(name) => {
                    // An endpoint that cannot report a capture format is disabled or unplugged
                    let available = device.default_input_config().is_ok();
                    devices.push(RawDevice::new(name.clone(), Some(name), available));
                }
                Err(e) => tracing::debug!(error = %e, "Skipping input device without a name"),
            }
        }

        Ok(RawSnapshot {
            devices,
            default_id,
        })
    }

    fn set_default_input(&self, _id: &DeviceId) -> Result<(), AudioError> {
        Err(AudioError::PlatformNotSupported(
            "Changing the default input device is not supported on Windows".to_string(),
        ))
    }
}
