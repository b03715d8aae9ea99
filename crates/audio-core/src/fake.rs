//! In-memory audio system for tests.
//!
//! Behaves like a well-mannered OS by default: switches take effect
//! immediately. Failures, delays and concurrent external changes can be
//! scripted per instance.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::device::{DeviceId, RawDevice, RawSnapshot};
use crate::error::AudioError;
use crate::traits::AudioSystemClient;

#[derive(Default)]
struct FakeState {
    devices: Vec<RawDevice>,
    default_id: Option<DeviceId>,
    query_failures: VecDeque<AudioError>,
    reject_reason: Option<String>,
    ignore_switches: bool,
    hijack: Option<(DeviceId, usize)>,
    query_delay: Duration,
    switch_delay: Duration,
    after_switch_delay: Duration,
    after_switch_failure: Option<AudioError>,
}

#[derive(Default)]
pub struct FakeAudioSystem {
    state: Mutex<FakeState>,
    queries: AtomicUsize,
    switches: AtomicUsize,
    after_switches: AtomicUsize,
    switches_in_flight: AtomicUsize,
    max_switches_in_flight: AtomicUsize,
}

impl FakeAudioSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devices as `(id, name, available)` with an optional default id.
    pub fn with_devices(devices: &[(&str, &str, bool)], default_id: Option<&str>) -> Self {
        let fake = Self::new();
        fake.set_devices(devices, default_id);
        fake
    }

    pub fn set_devices(&self, devices: &[(&str, &str, bool)], default_id: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        state.devices = devices
            .iter()
            .map(|(id, name, available)| RawDevice::new(*id, Some(name.to_string()), *available))
            .collect();
        state.default_id = default_id.map(DeviceId::from);
    }

    /// Remove a device as if it had been unplugged.
    pub fn unplug(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        state.devices.retain(|d| d.id.as_str() != id);
        if state.default_id.as_ref().map(DeviceId::as_str) == Some(id) {
            state.default_id = None;
        }
    }

    /// Make another process change the default input.
    pub fn external_switch(&self, id: &str) {
        self.state.lock().unwrap().default_id = Some(DeviceId::from(id));
    }

    /// The next queries fail with these errors, in order.
    pub fn fail_queries(&self, errors: impl IntoIterator<Item = AudioError>) {
        self.state.lock().unwrap().query_failures.extend(errors);
    }

    pub fn reject_switches(&self, reason: &str) {
        self.state.lock().unwrap().reject_reason = Some(reason.to_string());
    }

    /// Accept switch requests without applying them.
    pub fn ignore_switches(&self) {
        self.state.lock().unwrap().ignore_switches = true;
    }

    /// After each of the next `times` accepted switches, another process
    /// immediately makes `id` the default.
    pub fn hijack_switches(&self, id: &str, times: usize) {
        self.state.lock().unwrap().hijack = Some((DeviceId::from(id), times));
    }

    pub fn set_query_delay(&self, delay: Duration) {
        self.state.lock().unwrap().query_delay = delay;
    }

    pub fn set_switch_delay(&self, delay: Duration) {
        self.state.lock().unwrap().switch_delay = delay;
    }

    /// Slow down the follow-up that runs after a confirmed switch.
    pub fn set_after_switch_delay(&self, delay: Duration) {
        self.state.lock().unwrap().after_switch_delay = delay;
    }

    pub fn fail_after_switch(&self, err: AudioError) {
        self.state.lock().unwrap().after_switch_failure = Some(err);
    }

    pub fn default_id(&self) -> Option<DeviceId> {
        self.state.lock().unwrap().default_id.clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn switch_count(&self) -> usize {
        self.switches.load(Ordering::SeqCst)
    }

    /// Follow-ups completed, including failed ones.
    pub fn after_switch_count(&self) -> usize {
        self.after_switches.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_switches(&self) -> usize {
        self.max_switches_in_flight.load(Ordering::SeqCst)
    }
}

impl AudioSystemClient for FakeAudioSystem {
    fn backend_name(&self) -> &'static str {
        "fake"
    }

    fn query(&self) -> Result<RawSnapshot, AudioError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let delay = self.state.lock().unwrap().query_delay;
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.query_failures.pop_front() {
            return Err(err);
        }

        Ok(RawSnapshot {
            devices: state.devices.clone(),
            default_id: state.default_id.clone(),
        })
    }

    fn set_default_input(&self, id: &DeviceId) -> Result<(), AudioError> {
        self.switches.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.switches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_switches_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = self.state.lock().unwrap().switch_delay;
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let result = {
            let mut state = self.state.lock().unwrap();
            if let Some(reason) = &state.reject_reason {
                Err(AudioError::SwitchRejected {
                    id: id.clone(),
                    reason: reason.clone(),
                })
            } else if !state.devices.iter().any(|d| &d.id == id) {
                Err(AudioError::SwitchRejected {
                    id: id.clone(),
                    reason: "no such device".to_string(),
                })
            } else {
                if !state.ignore_switches {
                    state.default_id = Some(id.clone());
                }
                if let Some((hijacker, remaining)) = state.hijack.take() {
                    state.default_id = Some(hijacker.clone());
                    if remaining > 1 {
                        state.hijack = Some((hijacker, remaining - 1));
                    }
                }
                Ok(())
            }
        };

        self.switches_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
    fn after_switch(&self, _id: &DeviceId) -> Result<(), AudioError> {
        // Counts as a switch in flight: the OS is still being touched.
        let in_flight = self.switches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_switches_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let (delay, failure) = {
            let state = self.state.lock().unwrap();
            (state.after_switch_delay, state.after_switch_failure.clone())
        };
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        self.after_switches.fetch_add(1, Ordering::SeqCst);
        self.switches_in_flight.fetch_sub(1, Ordering::SeqCst);
        failure.map_or(Ok(()), Err)
    }
}
