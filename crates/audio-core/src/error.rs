use std::time::Duration;

use thiserror::Error;

use crate::device::DeviceId;

/// Why enumerating devices failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryFailure {
    #[error("permission to access audio devices was denied")]
    PermissionDenied,

    #[error("audio subsystem unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected response from audio subsystem: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("Failed to query audio devices: {0}")]
    DeviceQuery(QueryFailure),

    #[error("Device not available: {0}")]
    DeviceNotFound(DeviceId),

    #[error("No available input device to switch to")]
    NoAvailableDevice,

    #[error("Switch to {id} rejected: {reason}")]
    SwitchRejected { id: DeviceId, reason: String },

    #[error("Default input is {} after switching to {}", describe_actual(.actual), .requested)]
    SwitchVerification {
        requested: DeviceId,
        actual: Option<DeviceId>,
    },

    #[error("{operation} timed out after {}ms", .timeout.as_millis())]
    OperationTimeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

fn describe_actual(actual: &Option<DeviceId>) -> &str {
    actual.as_ref().map(DeviceId::as_str).unwrap_or("unset")
}

impl AudioError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::DeviceQuery(QueryFailure::Unavailable(reason.into()))
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::DeviceQuery(QueryFailure::Malformed(reason.into()))
    }

    pub fn permission_denied() -> Self {
        Self::DeviceQuery(QueryFailure::PermissionDenied)
    }

    /// Stable tag for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DeviceQuery(QueryFailure::PermissionDenied) => "permission_denied",
            Self::DeviceQuery(_) => "device_query",
            Self::DeviceNotFound(_) => "device_not_found",
            Self::NoAvailableDevice => "no_available_device",
            Self::SwitchRejected { .. } => "switch_rejected",
            Self::SwitchVerification { .. } => "switch_verification",
            Self::OperationTimeout { .. } => "timeout",
            Self::PlatformNotSupported(_) => "platform_not_supported",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    /// Message meant for the person at the launcher, with a next step
    /// where one exists.
    pub fn user_message(&self) -> String {
        match self {
            Self::DeviceQuery(QueryFailure::PermissionDenied) => {
                "Grant microphone/audio permission to the launcher and try again".to_string()
            }
            Self::DeviceQuery(QueryFailure::Unavailable(_)) => {
                "Audio system unavailable. Make sure PulseAudio/PipeWire (or CoreAudio) is running"
                    .to_string()
            }
            Self::DeviceQuery(QueryFailure::Malformed(reason)) => {
                format!("Could not read audio devices: {}", reason)
            }
            Self::DeviceNotFound(_) => {
                "Device no longer available. Refresh the list and try again".to_string()
            }
            Self::NoAvailableDevice => {
                "No usable microphone found. Connect one and try again".to_string()
            }
            Self::SwitchRejected { reason, .. } => format!("Switch refused: {}", reason),
            Self::SwitchVerification { .. } => {
                "Default microphone changed by another application. Try again".to_string()
            }
            Self::OperationTimeout { operation, .. } => {
                format!("Audio system did not respond ({}). Try again", operation)
            }
            Self::PlatformNotSupported(_) | Self::InvalidConfig(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_message_names_both_ids() {
        let err = AudioError::SwitchVerification {
            requested: DeviceId::from("B"),
            actual: Some(DeviceId::from("C")),
        };
        assert_eq!(err.to_string(), "Default input is C after switching to B");

        let err = AudioError::SwitchVerification {
            requested: DeviceId::from("B"),
            actual: None,
        };
        assert_eq!(err.to_string(), "Default input is unset after switching to B");
    }

    #[test]
    fn test_timeout_message() {
        let err = AudioError::OperationTimeout {
            operation: "list devices",
            timeout: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "list devices timed out after 1500ms");
    }

    #[test]
    fn test_no_available_device_names_the_problem() {
        let err = AudioError::NoAvailableDevice;
        assert_eq!(err.to_string(), "No available input device to switch to");
        assert_eq!(err.kind(), "no_available_device");
    }

    #[test]
    fn test_permission_denied_is_actionable() {
        let err = AudioError::permission_denied();
        assert_eq!(err.kind(), "permission_denied");
        assert!(err.user_message().contains("permission"));
    }
}
