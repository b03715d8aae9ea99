//! Windows adapter for micswitch (listing only)
//!
//! Enumeration goes through cpal's WASAPI host. Windows offers no public
//! API for changing the default capture endpoint, so switching reports
//! [`AudioError::PlatformNotSupported`].
//!
//! cpal only exposes endpoint names, so ids here are names: not unique when
//! two endpoints share a name, and not stable if the user renames one.

#[cfg(target_os = "windows")]
mod device;

#[cfg(target_os = "windows")]
pub use device::WasapiClient;
pub use micswitch_audio_core::{AudioError, AudioSystemClient};
