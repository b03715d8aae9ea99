//! Linux adapter for micswitch
//!
//! Talks to PulseAudio, or PipeWire through its PulseAudio compatibility
//! layer, by driving `pactl`.

mod client;
mod pactl;
mod parse;

pub use client::PulseAudioClient;
pub use micswitch_audio_core::{AudioError, AudioSystemClient};
pub use pactl::{Pactl, PactlError};
