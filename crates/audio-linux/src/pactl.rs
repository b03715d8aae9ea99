//! Bounded `pactl` invocations.
//!
//! Works against both PulseAudio and PipeWire (through pipewire-pulse).
//! Output is always read with `LC_ALL=C` so field labels stay parseable.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

/// How often a running child is checked for exit
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

const PROGRAM: &str = "pactl";

#[derive(Error, Debug)]
pub enum PactlError {
    #[error("{0} not found, install pulseaudio-utils or pipewire-pulse")]
    NotInstalled(String),

    #[error("{command} did not finish within {}ms", .timeout.as_millis())]
    Timeout { command: String, timeout: Duration },

    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to run {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl PactlError {
    /// Message text the daemon produced, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pactl {
    program: String,
    leading_args: Vec<String>,
}

impl Default for Pactl {
    fn default() -> Self {
        Self::with_program(PROGRAM)
    }
}

impl Pactl {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Run `program` with `leading_args` placed before every command's own
    /// arguments, e.g. a wrapper script or `flatpak-spawn --host pactl`.
    pub fn with_leading_args(program: impl Into<String>, leading_args: &[&str]) -> Self {
        Self {
            program: program.into(),
            leading_args: leading_args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Run `pactl <args>` and return its stdout, killing it past `timeout`.
    pub fn run(&self, args: &[&str], timeout: Duration) -> Result<String, PactlError> {
        let command = format!("{} {}", PROGRAM, args.join(" "));
        tracing::trace!(%command, "Running");

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => PactlError::NotInstalled(self.program.clone()),
                _ => PactlError::Io {
                    command: command.clone(),
                    source,
                },
            })?;

        // Drain pipes on their own threads so a full pipe cannot stall the child
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_with_deadline(&mut child, timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(PactlError::Timeout { command, timeout });
            }
            Err(source) => {
                let _ = child.kill();
                return Err(PactlError::Io { command, source });
            }
        };

        let stdout = join_output(stdout);
        let stderr = join_output(stderr);

        if status.success() {
            Ok(stdout)
        } else {
            Err(PactlError::Failed {
                command,
                status,
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_output(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
