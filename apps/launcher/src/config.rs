//! Loading the launcher configuration file
//!
//! The file is optional. When present it is JSON matching
//! [`micswitch_audio_core::Config`]; missing fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use micswitch_audio_core::{AudioError, Config};

const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "micswitch";
const APP_NAME: &str = "micswitch";
const CONFIG_FILE: &str = "config.json";

/// `config.json` inside the per-user config directory, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Load from `explicit` if given (it must exist), else from the default
/// location if a file is there, else defaults.
pub fn load(explicit: Option<&Path>) -> Result<Config, AudioError> {
    match explicit {
        Some(path) => read(path),
        None => match default_config_path() {
            Some(path) if path.is_file() => read(&path),
            _ => Ok(Config::default()),
        },
    }
}

fn read(path: &Path) -> Result<Config, AudioError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AudioError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
    let config: Config = serde_json::from_str(&text)
        .map_err(|e| AudioError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
    config.validate()?;

    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}
