//! micswitch
//!
//! Command-line entry point that launcher extensions (Ulauncher, Raycast)
//! call to list microphones and change the default one.
//!
//! # Architecture
//!
//! - [`backend`]: picks the platform adapter for the host OS
//! - [`config`]: optional JSON configuration file
//! - [`commands`]: `list` / `default` / `switch` / `cycle` handlers
//! - [`output`]: JSON (launcher contract) and text rendering
//!
//! # Platform Support
//!
//! - **Linux**: PulseAudio / PipeWire via `pactl`
//! - **macOS**: CoreAudio
//! - **Windows**: listing only

mod backend;
mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CommandError, Launcher, SwitchTarget};
use output::{Outcome, OutputFormat};

#[derive(Parser)]
#[command(name = "micswitch")]
#[command(version)]
#[command(about = "List microphones and switch the default one", long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Configuration file (defaults to config.json in the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List input devices, marking the current default
    #[command(alias = "ls")]
    List {
        /// Only show devices whose name or id contains this text
        query: Vec<String>,

        /// Maximum number of devices to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the current default input device
    Default,

    /// Make a device the default input
    Switch {
        /// Device id as printed by `list`
        id: Option<String>,

        /// Select by name instead of id
        #[arg(long, conflicts_with = "id")]
        name: Option<String>,
    },

    /// Make the next available device the default input
    Cycle,
}

fn init_logging(verbose: bool) {
    let level = if verbose || cfg!(debug_assertions) {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the launcher contract, logs go to stderr
    #[cfg(debug_assertions)]
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = cli.format;
    match run(cli) {
        Ok(outcome) => {
            output::print_outcome(&outcome, format);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(kind = e.kind(), error = %e, "Command failed");
            output::print_error(&e, format);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Outcome, CommandError> {
    let config = config::load(cli.config.as_deref())?;
    let client = backend::platform_client(&config);
    let launcher = Launcher::new(client, config);

    // Device calls block inside the OS; they run on the blocking pool while
    // this thread only waits for them with a timeout.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CommandError::Internal(format!("Failed to create tokio runtime: {}", e)))?;

    let command = cli.command;
    runtime.block_on(async move {
        match command {
            Commands::List { query, limit } => {
                let query = query.join(" ");
                launcher.list(&query, limit).await.map(Outcome::List)
            }
            Commands::Default => launcher.default_device().await.map(Outcome::Default),
            Commands::Switch { id, name } => {
                let target = match (id, name) {
                    (Some(id), _) => SwitchTarget::Id(id),
                    (None, Some(name)) => SwitchTarget::Name(name),
                    (None, None) => SwitchTarget::Preferred,
                };
                launcher.switch(target).await.map(Outcome::Switched)
            }
            Commands::Cycle => launcher.cycle().await.map(Outcome::Switched),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_switch_id_and_name_conflict() {
        let result = Cli::try_parse_from(["micswitch", "switch", "mic.usb", "--name", "USB Mic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_query_words_and_format() {
        let cli = Cli::try_parse_from(["micswitch", "--format", "text", "ls", "usb", "mic", "-l", "3"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Text);
        match cli.command {
            Commands::List { query, limit } => {
                assert_eq!(query, vec!["usb", "mic"]);
                assert_eq!(limit, Some(3));
            }
            _ => panic!("expected list"),
        }
    }
}
