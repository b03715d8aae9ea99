//! Parsers for `pactl` text output (C locale).

use micswitch_audio_core::{DeviceId, RawDevice};

/// One `Source #N` block of `pactl list sources`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRecord {
    pub name: String,
    pub description: Option<String>,
    pub is_monitor: bool,
    pub available: bool,
}

impl SourceRecord {
    pub fn into_raw(self) -> RawDevice {
        RawDevice::new(DeviceId::new(self.name), self.description, self.available)
    }
}

/// Extract the `Default Source:` line of `pactl info`.
pub fn parse_default_source(info: &str) -> Option<String> {
    info.lines()
        .filter_map(|line| line.trim().strip_prefix("Default Source:"))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

/// Parse `pactl list sources` into records, in the order pactl printed them.
pub fn parse_sources(listing: &str) -> Vec<SourceRecord> {
    let mut records = Vec::new();
    let mut current: Option<SourceBuilder> = None;

    for line in listing.lines() {
        if line.starts_with("Source #") {
            if let Some(builder) = current.take() {
                records.extend(builder.finish());
            }
            current = Some(SourceBuilder::default());
            continue;
        }

        if let Some(builder) = current.as_mut() {
            builder.feed(line);
        }
    }

    if let Some(builder) = current {
        records.extend(builder.finish());
    }

    records
}

/// Stream indexes from `pactl list short source-outputs`.
pub fn parse_source_output_ids(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
enum Section {
    Top,
    Ports,
    Other,
}

#[derive(Debug)]
struct SourceBuilder {
    name: Option<String>,
    description: Option<String>,
    monitor_of: Option<String>,
    device_class: Option<String>,
    active_port: Option<String>,
    ports: Vec<(String, bool)>,
    section: Section,
}

impl Default for SourceBuilder {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            monitor_of: None,
            device_class: None,
            active_port: None,
            ports: Vec::new(),
            section: Section::Top,
        }
    }
}

impl SourceBuilder {
    fn feed(&mut self, line: &str) {
        let depth = line.chars().take_while(|c| *c == '\t').count();
        let text = line.trim();
        if text.is_empty() {
            return;
        }

        if depth <= 1 {
            self.section = Section::Top;
            let Some((key, value)) = text.split_once(':') else {
                return;
            };
            let value = value.trim();
            match key {
                "Name" => self.name = Some(value.to_string()),
                "Description" => self.description = Some(value.to_string()),
                "Monitor of Sink" if value != "n/a" => self.monitor_of = Some(value.to_string()),
                "Active Port" if value != "n/a" => self.active_port = Some(value.to_string()),
                "Ports" => self.section = Section::Ports,
                _ => self.section = Section::Other,
            }
            return;
        }

        match self.section {
            Section::Ports => {
                if let Some((port, details)) = text.split_once(':') {
                    self.ports
                        .push((port.trim().to_string(), !details.contains("not available")));
                }
            }
            Section::Other => {
                if let Some(value) = text.strip_prefix("device.class = ") {
                    self.device_class = Some(value.trim_matches('"').to_string());
                }
            }
            Section::Top => {}
        }
    }

    fn finish(self) -> Option<SourceRecord> {
        let name = self.name?;
        let is_monitor = self.monitor_of.is_some()
            || self.device_class.as_deref() == Some("monitor")
            || name.ends_with(".monitor");

        let available = match &self.active_port {
            Some(active) => self
                .ports
                .iter()
                .find(|(port, _)| port == active)
                .map(|(_, available)| *available)
                .unwrap_or(true),
            None => true,
        };

        Some(SourceRecord {
            name,
            description: self.description,
            is_monitor,
            available,
        })
    }
}
