//! macOS adapter for micswitch
//!
//! Enumerates and switches input devices through CoreAudio's HAL. Device
//! ids are CoreAudio device UIDs, which persist across reboots, rather than
//! the per-boot `AudioObjectID`.

mod status;

#[cfg(target_os = "macos")]
mod device;

#[cfg(target_os = "macos")]
pub use device::CoreAudioClient;
pub use micswitch_audio_core::{AudioError, AudioSystemClient};
pub use status::{describe_status, is_hidden_device};
