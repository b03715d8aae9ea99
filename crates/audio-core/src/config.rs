//! Runtime settings shared by the registry, switcher and platform adapters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Upper bound for one device query
    pub query_timeout_ms: u64,
    /// Upper bound for the OS call that changes the default input
    pub switch_timeout_ms: u64,
    /// Upper bound for each external command a platform adapter runs
    pub command_timeout_ms: u64,
    /// Upper bound for moving one recording stream to the new device
    pub move_stream_timeout_ms: u64,
    /// Move streams that are already recording onto the new default
    pub move_streams: bool,
    /// Maximum number of devices a filtered listing returns
    pub max_results: usize,
    /// Device name `switch` targets when no id is given
    pub preferred_device: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query_timeout_ms: 2000,
            switch_timeout_ms: 3000,
            command_timeout_ms: 1500,
            move_stream_timeout_ms: 500,
            move_streams: true,
            max_results: 10,
            preferred_device: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), AudioError> {
        let timeouts = [
            ("query_timeout_ms", self.query_timeout_ms),
            ("switch_timeout_ms", self.switch_timeout_ms),
            ("command_timeout_ms", self.command_timeout_ms),
            ("move_stream_timeout_ms", self.move_stream_timeout_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(AudioError::InvalidConfig(format!(
                    "{} must be greater than 0",
                    field
                )));
            }
        }

        if self.max_results < 1 {
            return Err(AudioError::InvalidConfig(
                "max_results must be at least 1".to_string(),
            ));
        }

        if let Some(name) = &self.preferred_device {
            if name.trim().is_empty() {
                return Err(AudioError::InvalidConfig(
                    "preferred_device must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn switch_timeout(&self) -> Duration {
        Duration::from_millis(self.switch_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn move_stream_timeout(&self) -> Duration {
        Duration::from_millis(self.move_stream_timeout_ms)
    }
}
