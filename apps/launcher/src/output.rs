//! Rendering command results for launchers (JSON) and terminals (text).
//!
//! JSON goes to stdout in both the success and error case, since launcher
//! scripts read stdout only. Text errors go to stderr.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use crate::commands::{CommandError, DefaultResponse, ListResponse, SwitchResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

pub enum Outcome {
    List(ListResponse),
    Default(DefaultResponse),
    Switched(SwitchResponse),
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => println!("{}", json!({ "error": format!("Failed to serialize JSON: {}", e) })),
    }
}

pub fn print_outcome(outcome: &Outcome, format: OutputFormat) {
    match format {
        OutputFormat::Json => match outcome {
            Outcome::List(response) => print_json(response),
            Outcome::Default(response) => print_json(response),
            Outcome::Switched(response) => print_json(response),
        },
        OutputFormat::Text => match outcome {
            Outcome::List(response) => print_list(response),
            Outcome::Default(response) => match &response.device {
                Some(device) => println!("{} {}", device.name.bold(), device.id.as_str().dimmed()),
                None => println!("No default microphone"),
            },
            Outcome::Switched(response) => println!("{}", response.message.green()),
        },
    }
}

fn print_list(response: &ListResponse) {
    if response.total == 0 {
        println!("No microphones found");
        println!("{}", "Make sure PulseAudio/PipeWire is running".dimmed());
        return;
    }

    if response.devices.is_empty() {
        println!("No matching microphones");
        println!("{}", format!("Found {} source(s) total", response.total).dimmed());
        return;
    }

    for entry in &response.devices {
        let marker = if entry.device.is_default {
            "●".green().bold()
        } else {
            " ".normal()
        };
        let label = if entry.device.is_available {
            entry.label.normal()
        } else {
            format!("{} [unavailable]", entry.label).dimmed()
        };
        println!("{} {}", marker, label);
        println!("    ID: {}", entry.device.id.as_str().dimmed());
    }
}

pub fn print_error(error: &CommandError, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&json!({
            "error": error.user_message(),
            "kind": error.kind(),
            "detail": error.to_string(),
        })),
        OutputFormat::Text => eprintln!("{}: {}", "Error".red().bold(), error.user_message()),
    }
}
