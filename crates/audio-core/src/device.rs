use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier the OS assigns to an audio input endpoint.
///
/// Only ever compared for equality. Its stability across reboots depends on
/// the platform adapter that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One audio input endpoint, as seen in a single snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    pub is_default: bool,
    pub is_available: bool,
}

impl DeviceInfo {
    pub fn new(id: DeviceId, name: String, is_default: bool, is_available: bool) -> Self {
        Self {
            id,
            name,
            is_default,
            is_available,
        }
    }
}

/// A device record as reported by a platform adapter, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDevice {
    pub id: DeviceId,
    pub name: Option<String>,
    pub available: bool,
}

impl RawDevice {
    pub fn new(id: impl Into<DeviceId>, name: Option<String>, available: bool) -> Self {
        Self {
            id: id.into(),
            name,
            available,
        }
    }
}

/// Everything one platform query returns: the input devices in OS
/// enumeration order and the id the OS currently treats as default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSnapshot {
    pub devices: Vec<RawDevice>,
    pub default_id: Option<DeviceId>,
}

/// Trim a raw OS label and collapse internal whitespace runs.
/// Falls back to the id when the OS gave no usable label.
pub fn normalize_name(raw: Option<&str>, id: &DeviceId) -> String {
    let collapsed = raw
        .map(|name| name.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    if collapsed.is_empty() {
        id.to_string()
    } else {
        collapsed
    }
}

/// Presentation labels for a device list where names may repeat.
///
/// The first occurrence of a name keeps it as is; later ones get ` (2)`,
/// ` (3)` and so on, in list order.
pub fn display_labels(devices: &[DeviceInfo]) -> Vec<String> {
    let mut seen: Vec<(&str, usize)> = Vec::new();

    devices
        .iter()
        .map(|device| {
            match seen.iter_mut().find(|(name, _)| *name == device.name) {
                Some((_, count)) => {
                    *count += 1;
                    format!("{} ({})", device.name, count)
                }
                None => {
                    seen.push((device.name.as_str(), 1));
                    device.name.clone()
                }
            }
        })
        .collect()
}
