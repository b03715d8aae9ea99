//! Normalized point-in-time view of the input devices.

use std::collections::HashSet;

use crate::device::{normalize_name, DeviceId, DeviceInfo, RawSnapshot};

/// The result of one registry query.
///
/// Built once from a [`RawSnapshot`] and never refreshed; callers that need
/// current state must query again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    devices: Vec<DeviceInfo>,
}

impl Snapshot {
    /// Normalize a raw platform result.
    ///
    /// Keeps OS enumeration order, drops later records that repeat an id,
    /// and marks the device matching `default_id` as the only default.
    pub fn from_raw(raw: RawSnapshot) -> Self {
        let mut seen = HashSet::new();
        let mut devices = Vec::with_capacity(raw.devices.len());

        for record in raw.devices {
            if !seen.insert(record.id.clone()) {
                tracing::warn!(id = %record.id, "Dropping duplicate device id reported by OS");
                continue;
            }

            let name = normalize_name(record.name.as_deref(), &record.id);
            let is_default = raw.default_id.as_ref() == Some(&record.id);
            devices.push(DeviceInfo::new(record.id, name, is_default, record.available));
        }

        if let Some(default_id) = &raw.default_id {
            if !devices.iter().any(|d| d.is_default) {
                tracing::warn!(id = %default_id, "OS default input is not among the listed devices");
            }
        }

        Self { devices }
    }

    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    pub fn into_devices(self) -> Vec<DeviceInfo> {
        self.devices
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn default_device(&self) -> Option<&DeviceInfo> {
        self.devices.iter().find(|d| d.is_default)
    }

    pub fn find(&self, id: &DeviceId) -> Option<&DeviceInfo> {
        self.devices.iter().find(|d| &d.id == id)
    }

    /// Resolve a human-readable name to a device.
    ///
    /// Exact matches win over case-insensitive ones. Among several devices
    /// sharing the name, an available one is preferred, then OS order.
    pub fn find_by_name(&self, name: &str) -> Option<&DeviceInfo> {
        let wanted = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if wanted.is_empty() {
            return None;
        }

        let exact: Vec<&DeviceInfo> = self.devices.iter().filter(|d| d.name == wanted).collect();
        let candidates = if exact.is_empty() {
            let lowered = wanted.to_lowercase();
            self.devices
                .iter()
                .filter(|d| d.name.to_lowercase() == lowered)
                .collect()
        } else {
            exact
        };

        candidates
            .iter()
            .find(|d| d.is_available)
            .or_else(|| candidates.first())
            .copied()
    }

    /// The next available device after the current default, wrapping around.
    ///
    /// With no default, the first available device is returned.
    pub fn next_after_default(&self) -> Option<&DeviceInfo> {
        let start = self
            .devices
            .iter()
            .position(|d| d.is_default)
            .map(|i| i + 1)
            .unwrap_or(0);

        let n = self.devices.len();
        (0..n)
            .map(|offset| &self.devices[(start + offset) % n])
            .find(|d| d.is_available)
    }
}
