//! Audio device registry
//!
//! Produces a fresh [`Snapshot`] of the input devices on every call. Nothing
//! is cached: the OS is the only source of truth and devices come and go
//! between calls.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::device::DeviceInfo;
use crate::error::{AudioError, QueryFailure};
use crate::filter::{DeviceFilter, FilteredDevices};
use crate::snapshot::Snapshot;
use crate::traits::AudioSystemClient;

pub struct DeviceRegistry<C> {
    client: Arc<C>,
    query_timeout: Duration,
}

impl<C> Clone for DeviceRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            query_timeout: self.query_timeout,
        }
    }
}

impl<C: AudioSystemClient> DeviceRegistry<C> {
    pub fn new(client: Arc<C>, config: &Config) -> Self {
        Self::with_timeout(client, config.query_timeout())
    }

    pub fn with_timeout(client: Arc<C>, query_timeout: Duration) -> Self {
        Self {
            client,
            query_timeout,
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Query the OS once and normalize the result.
    ///
    /// An unreachable subsystem is retried a single time; permission
    /// failures and timeouts are returned as is.
    pub async fn snapshot(&self) -> Result<Snapshot, AudioError> {
        match self.query_once().await {
            Err(AudioError::DeviceQuery(QueryFailure::Unavailable(reason))) => {
                tracing::warn!(
                    backend = self.client.backend_name(),
                    %reason,
                    "Device query failed, retrying once"
                );
                self.query_once().await
            }
            other => other,
        }
    }

    /// All input devices in OS enumeration order.
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>, AudioError> {
        Ok(self.snapshot().await?.into_devices())
    }

    /// The current default input, taken from the same snapshot as the list.
    pub async fn default_device(&self) -> Result<Option<DeviceInfo>, AudioError> {
        Ok(self.snapshot().await?.default_device().cloned())
    }

    /// Listing as a launcher search shows it: labeled, filtered and limited.
    pub async fn list_matching(&self, filter: &DeviceFilter) -> Result<FilteredDevices, AudioError> {
        Ok(filter.apply(self.list_devices().await?))
    }

    async fn query_once(&self) -> Result<Snapshot, AudioError> {
        let raw = run_blocking(&self.client, "list devices", self.query_timeout, |client| {
            client.query()
        })
        .await?;

        let snapshot = Snapshot::from_raw(raw);
        tracing::debug!(
            backend = self.client.backend_name(),
            devices = snapshot.len(),
            default = ?snapshot.default_device().map(|d| d.id.as_str()),
            "Queried input devices"
        );
        Ok(snapshot)
    }
}

/// Run a blocking adapter call on the blocking pool, bounded by `timeout`.
///
/// On timeout the worker thread is left to finish on its own; its result is
/// discarded.
pub(crate) async fn run_blocking<C, T, F>(
    client: &Arc<C>,
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, AudioError>
where
    C: AudioSystemClient,
    T: Send + 'static,
    F: FnOnce(&C) -> Result<T, AudioError> + Send + 'static,
{
    let client = Arc::clone(client);
    let task = tokio::task::spawn_blocking(move || call(&client));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(AudioError::unavailable(format!(
            "{} worker failed: {}",
            operation, join_error
        ))),
        Err(_) => Err(AudioError::OperationTimeout { operation, timeout }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceId;
    use crate::fake::FakeAudioSystem;

    fn registry(fake: FakeAudioSystem) -> (Arc<FakeAudioSystem>, DeviceRegistry<FakeAudioSystem>) {
        let fake = Arc::new(fake);
        let registry = DeviceRegistry::new(Arc::clone(&fake), &Config::default());
        (fake, registry)
    }

    #[tokio::test]
    async fn test_lists_in_os_order_with_single_default() {
        let (_, registry) = registry(FakeAudioSystem::with_devices(
            &[("A", "Alpha", true), ("B", "Beta", true), ("C", "Gamma", false)],
            Some("B"),
        ));

        let devices = registry.list_devices().await.unwrap();
        let ids: Vec<&str> = devices.iter().map(|d| d.id.as_str()).collect();

        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(devices.iter().filter(|d| d.is_default).count(), 1);
        assert!(!devices[2].is_available);
    }

    #[tokio::test]
    async fn test_default_none_iff_empty() {
        let (fake, registry) = registry(FakeAudioSystem::new());

        assert!(registry.list_devices().await.unwrap().is_empty());
        assert!(registry.default_device().await.unwrap().is_none());

        fake.set_devices(&[("A", "Alpha", true)], Some("A"));
        assert_eq!(
            registry.default_device().await.unwrap().unwrap().id,
            DeviceId::from("A")
        );
    }

    #[tokio::test]
    async fn test_default_device_uses_one_query() {
        let (fake, registry) = registry(FakeAudioSystem::with_devices(
            &[("A", "Alpha", true)],
            Some("A"),
        ));

        registry.default_device().await.unwrap();
        assert_eq!(fake.query_count(), 1);
    }

    #[tokio::test]
    async fn test_every_call_requeries() {
        let (fake, registry) = registry(FakeAudioSystem::with_devices(
            &[("A", "Alpha", true), ("B", "Beta", true)],
            Some("A"),
        ));

        assert_eq!(registry.list_devices().await.unwrap().len(), 2);
        fake.external_switch("B");
        assert_eq!(
            registry.default_device().await.unwrap().unwrap().id,
            DeviceId::from("B")
        );
        fake.unplug("B");
        assert_eq!(registry.list_devices().await.unwrap().len(), 1);
        assert_eq!(fake.query_count(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_retried_once() {
        let (fake, registry) = registry(FakeAudioSystem::with_devices(
            &[("A", "Alpha", true)],
            Some("A"),
        ));
        fake.fail_queries([AudioError::unavailable("connection refused")]);

        assert_eq!(registry.list_devices().await.unwrap().len(), 1);
        assert_eq!(fake.query_count(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_surfaces_after_second_failure() {
        let (fake, registry) = registry(FakeAudioSystem::with_devices(
            &[("A", "Alpha", true)],
            Some("A"),
        ));
        fake.fail_queries([
            AudioError::unavailable("connection refused"),
            AudioError::unavailable("connection refused"),
            AudioError::unavailable("connection refused"),
        ]);

        let err = registry.list_devices().await.unwrap_err();
        assert!(matches!(err, AudioError::DeviceQuery(QueryFailure::Unavailable(_))));
        assert_eq!(fake.query_count(), 2);
    }

    #[tokio::test]
    async fn test_permission_denied_not_retried() {
        let (fake, registry) = registry(FakeAudioSystem::new());
        fake.fail_queries([AudioError::permission_denied()]);

        let err = registry.list_devices().await.unwrap_err();
        assert_eq!(err, AudioError::permission_denied());
        assert_eq!(fake.query_count(), 1);
    }

    #[tokio::test]
    async fn test_slow_query_times_out() {
        let fake = Arc::new(FakeAudioSystem::with_devices(&[("A", "Alpha", true)], Some("A")));
        fake.set_query_delay(Duration::from_millis(300));
        let registry = DeviceRegistry::with_timeout(Arc::clone(&fake), Duration::from_millis(20));

        let err = registry.list_devices().await.unwrap_err();
        assert!(matches!(
            err,
            AudioError::OperationTimeout {
                operation: "list devices",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_list_matching_filters_and_limits() {
        let (_, registry) = registry(FakeAudioSystem::with_devices(
            &[
                ("usb-1", "USB Mic", true),
                ("pci-1", "Built-in", true),
                ("usb-2", "USB Mic", true),
            ],
            Some("pci-1"),
        ));

        let found = registry
            .list_matching(&DeviceFilter::new("usb", 1))
            .await
            .unwrap();
        assert_eq!(found.total, 3);
        assert_eq!(found.devices.len(), 1);
        assert_eq!(found.devices[0].device.id, DeviceId::from("usb-1"));
    }
}
