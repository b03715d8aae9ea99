use std::mem;
use std::os::raw::c_void;
use std::ptr;

use core_foundation::base::TCFType;
use core_foundation::string::{CFString, CFStringRef};
use coreaudio::audio_unit::macos_helpers::{
    get_audio_device_ids, get_audio_device_supports_scope, get_default_device_id, get_device_name,
};
use coreaudio::audio_unit::Scope;
use coreaudio::sys::{
    kAudioDevicePropertyDeviceIsAlive, kAudioDevicePropertyDeviceUID,
    kAudioHardwarePropertyDefaultInputDevice, kAudioObjectPropertyElementMaster,
    kAudioObjectPropertyScopeGlobal, kAudioObjectSystemObject, AudioDeviceID,
    AudioObjectGetPropertyData, AudioObjectPropertyAddress, AudioObjectSetPropertyData,
};
use micswitch_audio_core::{AudioError, AudioSystemClient, DeviceId, RawDevice, RawSnapshot};

use crate::status::{describe_status, is_hidden_device};

/// CoreAudio adapter.
///
/// CoreAudio has no combined "devices plus default" query; the default is
/// read right after enumeration, leaving a narrow window in which another
/// process may change it.
#[derive(Debug, Default, Clone)]
pub struct CoreAudioClient;

impl CoreAudioClient {
    pub fn new() -> Self {
        Self
    }
}

struct InputDevice {
    object_id: AudioDeviceID,
    uid: String,
    name: Option<String>,
    alive: bool,
}

fn global_address(selector: u32) -> AudioObjectPropertyAddress {
    AudioObjectPropertyAddress {
        mSelector: selector,
        mScope: kAudioObjectPropertyScopeGlobal,
        mElement: kAudioObjectPropertyElementMaster,
    }
}

fn device_uid(device: AudioDeviceID) -> Option<String> {
    let address = global_address(kAudioDevicePropertyDeviceUID);
    let mut uid: CFStringRef = ptr::null();
    let mut size = mem::size_of::<CFStringRef>() as u32;

    let status = unsafe {
        AudioObjectGetPropertyData(
            device,
            &address,
            0,
            ptr::null(),
            &mut size,
            &mut uid as *mut CFStringRef as *mut c_void,
        )
    };

    if status != 0 || uid.is_null() {
        tracing::debug!(device, status = %describe_status(status), "No UID for device");
        return None;
    }

    // The HAL hands back a retained string
    let uid = unsafe { CFString::wrap_under_create_rule(uid) };
    Some(uid.to_string())
}

fn device_is_alive(device: AudioDeviceID) -> bool {
    let address = global_address(kAudioDevicePropertyDeviceIsAlive);
    let mut alive: u32 = 0;
    let mut size = mem::size_of::<u32>() as u32;

    let status = unsafe {
        AudioObjectGetPropertyData(
            device,
            &address,
            0,
            ptr::null(),
            &mut size,
            &mut alive as *mut u32 as *mut c_void,
        )
    };

    // A device that cannot answer is treated as present
    status != 0 || alive != 0
}

fn input_devices() -> Result<Vec<InputDevice>, AudioError> {
    let ids = get_audio_device_ids()
        .map_err(|e| AudioError::unavailable(format!("Failed to get audio devices: {:?}", e)))?;

    let mut devices = Vec::new();
    for object_id in ids {
        if !get_audio_device_supports_scope(object_id, Scope::Input).unwrap_or(false) {
            continue;
        }

        let Some(uid) = device_uid(object_id) else {
            continue;
        };

        let name = get_device_name(object_id).ok();
        if name.as_deref().map(is_hidden_device).unwrap_or(false) {
            continue;
        }

        devices.push(InputDevice {
            object_id,
            uid,
            name,
            alive: device_is_alive(object_id),
        });
    }

    Ok(devices)
}

impl AudioSystemClient for CoreAudioClient {
    fn backend_name(&self) -> &'static str {
        "coreaudio"
    }

    fn query(&self) -> Result<RawSnapshot, AudioError> {
        let devices = input_devices()?;
        let default_object = get_default_device_id(true);

        let default_id = default_object.and_then(|object_id| {
            devices
                .iter()
                .find(|d| d.object_id == object_id)
                .map(|d| DeviceId::new(d.uid.clone()))
        });

        Ok(RawSnapshot {
            devices: devices
                .into_iter()
                .map(|d| RawDevice::new(d.uid, d.name, d.alive))
                .collect(),
            default_id,
        })
    }

    fn set_default_input(&self, id: &DeviceId) -> Result<(), AudioError> {
        // AudioObjectIDs are only valid for this boot, so resolve the UID now
        let target = input_devices()?
            .into_iter()
            .find(|d| d.uid == id.as_str())
            .ok_or_else(|| AudioError::DeviceNotFound(id.clone()))?;

        let address = global_address(kAudioHardwarePropertyDefaultInputDevice);
        let object_id: AudioDeviceID = target.object_id;

        let status = unsafe {
            AudioObjectSetPropertyData(
                kAudioObjectSystemObject,
                &address,
                0,
                ptr::null(),
                mem::size_of::<AudioDeviceID>() as u32,
                &object_id as *const AudioDeviceID as *const c_void,
            )
        };

        if status != 0 {
            return Err(AudioError::SwitchRejected {
                id: id.clone(),
                reason: format!("CoreAudio refused the change: {}", describe_status(status)),
            });
        }

        tracing::debug!(uid = %id, object_id, "Requested default input change");
        Ok(())
    }
}
