use serde::Serialize;

use crate::device::{display_labels, DeviceInfo};

/// Longest query text taken from a launcher; anything past it is ignored.
pub const MAX_QUERY_LEN: usize = 100;

/// A device with its name made unique within the full listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledDevice {
    #[serde(flatten)]
    pub device: DeviceInfo,
    pub label: String,
}

/// Devices left after filtering, plus how many there were before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredDevices {
    pub devices: Vec<LabeledDevice>,
    pub total: usize,
}

/// Narrow a device listing the way a launcher search box does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    query: String,
    limit: usize,
}

impl DeviceFilter {
    pub fn new(query: &str, limit: usize) -> Self {
        let query: String = query.trim().chars().take(MAX_QUERY_LEN).collect();
        Self {
            query: query.to_lowercase(),
            limit,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn matches(&self, device: &DeviceInfo) -> bool {
        self.query.is_empty()
            || device.name.to_lowercase().contains(&self.query)
            || device.id.as_str().to_lowercase().contains(&self.query)
    }

    /// Labels are computed over the whole list, so a match keeps the label
    /// it has in the unfiltered listing.
    pub fn apply(&self, devices: Vec<DeviceInfo>) -> FilteredDevices {
        let total = devices.len();
        let labels = display_labels(&devices);

        let devices = devices
            .into_iter()
            .zip(labels)
            .filter(|(device, _)| self.matches(device))
            .take(self.limit)
            .map(|(device, label)| LabeledDevice { device, label })
            .collect();

        FilteredDevices { devices, total }
    }
}
