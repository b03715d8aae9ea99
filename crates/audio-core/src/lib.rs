//! Microphone device manager core
//!
//! Platform-independent half of micswitch: device types, the error
//! taxonomy, the [`AudioSystemClient`] seam each OS crate implements, and
//! the [`DeviceRegistry`] / [`DefaultSwitcher`] pair built on top of it.

mod config;
mod device;
mod error;
mod filter;
mod registry;
mod snapshot;
mod switcher;
mod traits;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use config::Config;
pub use device::{display_labels, normalize_name, DeviceId, DeviceInfo, RawDevice, RawSnapshot};
pub use error::{AudioError, QueryFailure};
pub use filter::{DeviceFilter, FilteredDevices, LabeledDevice, MAX_QUERY_LEN};
pub use registry::DeviceRegistry;
pub use snapshot::Snapshot;
pub use switcher::DefaultSwitcher;
pub use traits::AudioSystemClient;
