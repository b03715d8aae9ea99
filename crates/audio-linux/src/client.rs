use std::time::Duration;

use micswitch_audio_core::{AudioError, AudioSystemClient, Config, DeviceId, RawSnapshot};

use crate::pactl::{Pactl, PactlError};
use crate::parse::{parse_default_source, parse_sources, parse_source_output_ids};

/// PulseAudio / PipeWire adapter.
///
/// Source names are the device ids; they are derived from the hardware path
/// and profile, so they survive reboots as long as the hardware stays put.
///
/// A query takes two `pactl` calls (`info`, then `list sources`), so a
/// default change landing between them can produce a snapshot with no
/// default marked. The next query corrects it.
#[derive(Debug, Clone)]
pub struct PulseAudioClient {
    pactl: Pactl,
    command_timeout: Duration,
    move_streams: bool,
    move_stream_timeout: Duration,
}

impl PulseAudioClient {
    pub fn new(config: &Config) -> Self {
        Self::with_pactl(Pactl::default(), config)
    }

    pub fn with_pactl(pactl: Pactl, config: &Config) -> Self {
        Self {
            pactl,
            command_timeout: config.command_timeout(),
            move_streams: config.move_streams,
            move_stream_timeout: config.move_stream_timeout(),
        }
    }

    /// Move every recording stream onto `source`.
    ///
    /// Best effort: a stream that refuses to move is logged and skipped.
    fn move_source_outputs(&self, source: &str) {
        let listing = match self
            .pactl
            .run(&["list", "short", "source-outputs"], self.command_timeout)
        {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list recording streams");
                return;
            }
        };

        for stream in parse_source_output_ids(&listing) {
            match self
                .pactl
                .run(&["move-source-output", &stream, source], self.move_stream_timeout)
            {
                Ok(_) => tracing::debug!(%stream, %source, "Moved recording stream"),
                Err(e) => tracing::warn!(%stream, error = %e, "Could not move recording stream"),
            }
        }
    }
}

impl AudioSystemClient for PulseAudioClient {
    fn backend_name(&self) -> &'static str {
        "pulseaudio"
    }

    fn query(&self) -> Result<RawSnapshot, AudioError> {
        let info = self
            .pactl
            .run(&["info"], self.command_timeout)
            .map_err(|e| query_error(e, "pactl info"))?;
        let listing = self
            .pactl
            .run(&["list", "sources"], self.command_timeout)
            .map_err(|e| query_error(e, "pactl list sources"))?;

        let default_name = parse_default_source(&info);

        // Monitors are loopbacks of outputs, not microphones, unless the user
        // already made one the default.
        let devices = parse_sources(&listing)
            .into_iter()
            .filter(|record| !record.is_monitor || default_name.as_deref() == Some(record.name.as_str()))
            .map(|record| record.into_raw())
            .collect();

        Ok(RawSnapshot {
            devices,
            default_id: default_name.map(DeviceId::new),
        })
    }

    fn set_default_input(&self, id: &DeviceId) -> Result<(), AudioError> {
        self.pactl
            .run(&["set-default-source", id.as_str()], self.command_timeout)
            .map_err(|e| switch_error(e, id))?;
        Ok(())
    }

    fn after_switch(&self, id: &DeviceId) -> Result<(), AudioError> {
        if self.move_streams {
            self.move_source_outputs(id.as_str());
        }
        Ok(())
    }
}

fn is_permission_problem(stderr: &str) -> bool {
    let lowered = stderr.to_lowercase();
    lowered.contains("access denied") || lowered.contains("permission denied")
}

fn query_error(err: PactlError, operation: &'static str) -> AudioError {
    if let PactlError::Timeout { timeout, .. } = err {
        return AudioError::OperationTimeout { operation, timeout };
    }

    match err.stderr() {
        Some(stderr) if is_permission_problem(stderr) => AudioError::permission_denied(),
        Some(stderr) if stderr.to_lowercase().contains("connection") => {
            AudioError::unavailable(stderr)
        }
        Some(_) => AudioError::malformed(err.to_string()),
        None => AudioError::unavailable(err.to_string()),
    }
}

fn switch_error(err: PactlError, id: &DeviceId) -> AudioError {
    match err {
        PactlError::Timeout { timeout, .. } => AudioError::OperationTimeout {
            operation: "pactl set-default-source",
            timeout,
        },
        PactlError::Failed { stderr, .. } => AudioError::SwitchRejected {
            id: id.clone(),
            reason: if stderr.is_empty() {
                "pactl refused the request".to_string()
            } else {
                stderr
            },
        },
        other => AudioError::unavailable(other.to_string()),
    }
}
