use crate::device::{DeviceId, RawSnapshot};
use crate::error::AudioError;

/// Platform adapter over the host audio subsystem.
///
/// Implementations block; the registry runs them off the caller's async
/// context and bounds them with a timeout.
pub trait AudioSystemClient: Send + Sync + 'static {
    /// Short name of the backing subsystem, for logs
    fn backend_name(&self) -> &'static str;

    /// Enumerate input devices and the current default in one round-trip
    /// where the OS allows it.
    ///
    /// Must fail with [`AudioError::DeviceQuery`] rather than return an empty
    /// snapshot when the subsystem cannot be reached.
    fn query(&self) -> Result<RawSnapshot, AudioError>;

    /// Ask the OS to make `id` the default input device.
    ///
    /// An explicit refusal is [`AudioError::SwitchRejected`]. Returning `Ok`
    /// only means the request was accepted, not that it took effect.
    fn set_default_input(&self, id: &DeviceId) -> Result<(), AudioError>;

    /// Follow-up work once `id` is confirmed as the default, such as moving
    /// open recording streams onto it.
    ///
    /// Runs under its own timeout. A failure here is logged and never turns
    /// a confirmed switch into an error.
    fn after_switch(&self, _id: &DeviceId) -> Result<(), AudioError> {
        Ok(())
    }
}
