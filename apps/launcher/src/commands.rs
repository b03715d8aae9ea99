//! Launcher command handlers
//!
//! Each handler maps one launcher action onto the device manager and
//! returns a serializable response. Presentation lives in `output`.

use micswitch_audio_core::{
    AudioError, AudioSystemClient, Config, DefaultSwitcher, DeviceFilter, DeviceId, DeviceInfo,
    DeviceRegistry, FilteredDevices,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Internal(String),
}

impl CommandError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Audio(e) => e.kind(),
            Self::Usage(_) => "usage",
            Self::Internal(_) => "internal",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Audio(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Labeled devices left by the search, with the unfiltered count.
pub type ListResponse = FilteredDevices;

#[derive(Debug, Clone, Serialize)]
pub struct DefaultResponse {
    pub device: Option<DeviceInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchResponse {
    pub success: bool,
    pub message: String,
    pub device: DeviceInfo,
}

impl SwitchResponse {
    fn switched(device: DeviceInfo) -> Self {
        Self {
            success: true,
            message: format!("Switched to audio source: {}", device.name),
            device,
        }
    }
}

/// What `switch` should target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchTarget {
    Id(String),
    Name(String),
    /// The `preferred_device` from configuration
    Preferred,
}

pub struct Launcher<C> {
    switcher: DefaultSwitcher<C>,
    config: Config,
}

impl<C: AudioSystemClient> Launcher<C> {
    pub fn new(client: C, config: Config) -> Self {
        let registry = DeviceRegistry::new(Arc::new(client), &config);
        let switcher = DefaultSwitcher::new(registry, &config);
        Self { switcher, config }
    }

    fn registry(&self) -> &DeviceRegistry<C> {
        self.switcher.registry()
    }

    /// Devices matching `query`, default marked, at most `limit` of them.
    pub async fn list(&self, query: &str, limit: Option<usize>) -> Result<ListResponse, CommandError> {
        let limit = limit.unwrap_or(self.config.max_results);
        if limit == 0 {
            return Err(CommandError::Usage("--limit must be at least 1".to_string()));
        }

        let filter = DeviceFilter::new(query, limit);
        Ok(self.registry().list_matching(&filter).await?)
    }

    pub async fn default_device(&self) -> Result<DefaultResponse, CommandError> {
        let device = self.registry().default_device().await?;
        Ok(DefaultResponse { device })
    }

    pub async fn switch(&self, target: SwitchTarget) -> Result<SwitchResponse, CommandError> {
        let device = match target {
            SwitchTarget::Id(id) => {
                let id = id.trim();
                if id.is_empty() {
                    return Err(CommandError::Usage("Device id cannot be empty".to_string()));
                }
                self.switcher.set_default_device(&DeviceId::new(id)).await?
            }
            SwitchTarget::Name(name) => {
                if name.trim().is_empty() {
                    return Err(CommandError::Usage("Device name cannot be empty".to_string()));
                }
                self.switcher.switch_to_name(&name).await?
            }
            SwitchTarget::Preferred => {
                let name = self.config.preferred_device.as_deref().ok_or_else(|| {
                    CommandError::Usage(
                        "No device given and no preferred_device configured".to_string(),
                    )
                })?;
                self.switcher.switch_to_name(name).await?
            }
        };

        Ok(SwitchResponse::switched(device))
    }

    /// The `switch` shortcut without a list view: next available device.
    pub async fn cycle(&self) -> Result<SwitchResponse, CommandError> {
        let device = self.switcher.cycle_next().await?;
        Ok(SwitchResponse::switched(device))
    }
}
