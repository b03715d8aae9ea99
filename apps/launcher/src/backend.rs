//! Platform adapter selection
//!
//! Exactly one adapter is compiled in, chosen by target OS.

use micswitch_audio_core::Config;

#[cfg(target_os = "linux")]
pub type PlatformClient = micswitch_audio_linux::PulseAudioClient;

#[cfg(target_os = "macos")]
pub type PlatformClient = micswitch_audio_macos::CoreAudioClient;

#[cfg(target_os = "windows")]
pub type PlatformClient = micswitch_audio_windows::WasapiClient;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub type PlatformClient = unsupported::UnsupportedClient;

/// Build the adapter for the host OS.
pub fn platform_client(config: &Config) -> PlatformClient {
    #[cfg(target_os = "linux")]
    {
        micswitch_audio_linux::PulseAudioClient::new(config)
    }

    #[cfg(target_os = "macos")]
    {
        let _ = config;
        micswitch_audio_macos::CoreAudioClient::new()
    }

    #[cfg(target_os = "windows")]
    {
        let _ = config;
        micswitch_audio_windows::WasapiClient::new()
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        let _ = config;
        unsupported::UnsupportedClient
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod unsupported {
    use micswitch_audio_core::{AudioError, AudioSystemClient, DeviceId, RawSnapshot};

    pub struct UnsupportedClient;

    impl AudioSystemClient for UnsupportedClient {
        fn backend_name(&self) -> &'static str {
            "unsupported"
        }

        fn query(&self) -> Result<RawSnapshot, AudioError> {
            Err(AudioError::PlatformNotSupported(std::env::consts::OS.to_string()))
        }

        fn set_default_input(&self, _id: &DeviceId) -> Result<(), AudioError> {
            Err(AudioError::PlatformNotSupported(std::env::consts::OS.to_string()))
        }
    }
}
