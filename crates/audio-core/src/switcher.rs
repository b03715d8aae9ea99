//! Default input switcher
//!
//! Every switch is one read-verify-write-verify cycle against fresh
//! registry queries. Switches within a process never interleave: a second
//! request waits until the one in flight has finished, including an OS call
//! that was abandoned on timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::Config;
use crate::device::{DeviceId, DeviceInfo};
use crate::error::AudioError;
use crate::registry::{run_blocking, DeviceRegistry};
use crate::traits::AudioSystemClient;

/// Held for the whole of one switch. It travels into the blocking OS call,
/// so a call abandoned on timeout keeps it until the OS actually returns.
type SwitchPermit = OwnedMutexGuard<()>;

/// A failed attempt hands the permit back when it still has it, so the
/// caller can retry without letting another switch in between.
type Attempt<T> = Result<T, (AudioError, Option<SwitchPermit>)>;

pub struct DefaultSwitcher<C> {
    registry: DeviceRegistry<C>,
    switch_timeout: Duration,
    in_flight: Arc<Mutex<()>>,
}

impl<C: AudioSystemClient> DefaultSwitcher<C> {
    pub fn new(registry: DeviceRegistry<C>, config: &Config) -> Self {
        Self::with_timeout(registry, config.switch_timeout())
    }

    pub fn with_timeout(registry: DeviceRegistry<C>, switch_timeout: Duration) -> Self {
        Self {
            registry,
            switch_timeout,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub fn registry(&self) -> &DeviceRegistry<C> {
        &self.registry
    }

    /// Make `id` the system default input and return it as now queried.
    ///
    /// A verification mismatch is retried once, since another process
    /// changing the default at the same moment is a benign race.
    pub async fn set_default_device(&self, id: &DeviceId) -> Result<DeviceInfo, AudioError> {
        let permit = Arc::clone(&self.in_flight).lock_owned().await;

        let (device, permit) = match self.switch_once(id, permit).await {
            Ok(done) => done,
            Err((err @ AudioError::SwitchVerification { .. }, Some(permit))) => {
                tracing::warn!(%id, error = %err, "Switch not confirmed, retrying once");
                self.switch_once(id, permit).await.map_err(|(err, _)| err)?
            }
            Err((err, _)) => return Err(err),
        };

        if let Some(permit) = permit {
            self.after_switch(&device.id, permit).await;
        }
        Ok(device)
    }

    /// Switch to the device carrying `name`, resolved against a live
    /// snapshot. Used for a configured preferred device, which is a name
    /// and never trusted as an id.
    pub async fn switch_to_name(&self, name: &str) -> Result<DeviceInfo, AudioError> {
        let snapshot = self.registry.snapshot().await?;
        let target = snapshot
            .find_by_name(name)
            .map(|d| d.id.clone())
            .ok_or_else(|| AudioError::DeviceNotFound(DeviceId::new(name.trim())))?;

        tracing::debug!(%name, id = %target, "Resolved device name");
        self.set_default_device(&target).await
    }

    /// Move the default to the next available device in OS order.
    pub async fn cycle_next(&self) -> Result<DeviceInfo, AudioError> {
        let snapshot = self.registry.snapshot().await?;
        let target = snapshot
            .next_after_default()
            .map(|d| d.id.clone())
            .ok_or(AudioError::NoAvailableDevice)?;

        self.set_default_device(&target).await
    }

    /// One read-verify-write-verify pass. Returns the permit only when the
    /// OS was actually changed, so follow-up work runs after real switches.
    async fn switch_once(
        &self,
        id: &DeviceId,
        permit: SwitchPermit,
    ) -> Attempt<(DeviceInfo, Option<SwitchPermit>)> {
        let before = match self.registry.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => return Err((err, Some(permit))),
        };
        let Some(target) = before.find(id) else {
            return Err((AudioError::DeviceNotFound(id.clone()), Some(permit)));
        };

        if target.is_default {
            tracing::debug!(%id, "Device already default, nothing to do");
            return Ok((target.clone(), None));
        }

        let requested = id.clone();
        let (outcome, permit) = run_blocking(
            self.registry.client(),
            "set default input",
            self.switch_timeout,
            move |client| Ok((client.set_default_input(&requested), permit)),
        )
        .await
        .map_err(|err| (err, None))?;
        if let Err(err) = outcome {
            return Err((err, Some(permit)));
        }

        let after = match self.registry.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => return Err((err, Some(permit))),
        };
        match after.default_device() {
            Some(current) if &current.id == id => {
                tracing::info!(%id, name = %current.name, "Default input switched");
                Ok((current.clone(), Some(permit)))
            }
            current => Err((
                AudioError::SwitchVerification {
                    requested: id.clone(),
                    actual: current.map(|d| d.id.clone()),
                },
                Some(permit),
            )),
        }
    }

    /// Adapter follow-up for a confirmed switch, under its own timeout.
    /// The permit is released only once the adapter returns.
    async fn after_switch(&self, id: &DeviceId, permit: SwitchPermit) {
        let confirmed = id.clone();
        let result = run_blocking(
            self.registry.client(),
            "after switch",
            self.switch_timeout,
            move |client| {
                let result = client.after_switch(&confirmed);
                drop(permit);
                result
            },
        )
        .await;

        if let Err(err) = result {
            tracing::warn!(%id, error = %err, "Follow-up after switch failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeAudioSystem;

    fn switcher(fake: FakeAudioSystem) -> (Arc<FakeAudioSystem>, DefaultSwitcher<FakeAudioSystem>) {
        let fake = Arc::new(fake);
        let config = Config::default();
        let registry = DeviceRegistry::new(Arc::clone(&fake), &config);
        (fake, DefaultSwitcher::new(registry, &config))
    }

    fn two_devices() -> FakeAudioSystem {
        FakeAudioSystem::with_devices(&[("A", "Alpha", true), ("B", "Beta", true)], Some("A"))
    }

    #[tokio::test]
    async fn test_switch_and_read_back() {
        let (fake, switcher) = switcher(two_devices());

        let info = switcher.set_default_device(&DeviceId::from("B")).await.unwrap();
        assert_eq!(info.id, DeviceId::from("B"));
        assert!(info.is_default);

        let devices = switcher.registry().list_devices().await.unwrap();
        assert!(!devices[0].is_default);
        assert!(devices[1].is_default);
        assert_eq!(fake.switch_count(), 1);
    }

    #[tokio::test]
    async fn test_switch_to_current_default_is_noop() {
        let (fake, switcher) = switcher(two_devices());

        for _ in 0..2 {
            let info = switcher.set_default_device(&DeviceId::from("A")).await.unwrap();
            assert!(info.is_default);
        }
        assert_eq!(fake.switch_count(), 0);
    }

    #[tokio::test]
    async fn test_repeat_switch_second_call_is_noop() {
        let (fake, switcher) = switcher(two_devices());

        switcher.set_default_device(&DeviceId::from("B")).await.unwrap();
        switcher.set_default_device(&DeviceId::from("B")).await.unwrap();
        assert_eq!(fake.switch_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (fake, switcher) = switcher(two_devices());

        let err = switcher
            .set_default_device(&DeviceId::from("nonexistent-id-123"))
            .await
            .unwrap_err();
        assert_eq!(err, AudioError::DeviceNotFound(DeviceId::from("nonexistent-id-123")));
        assert_eq!(fake.switch_count(), 0);
    }

    #[tokio::test]
    async fn test_no_devices_is_not_found() {
        let (_, switcher) = switcher(FakeAudioSystem::new());

        let err = switcher.set_default_device(&DeviceId::from("x")).await.unwrap_err();
        assert!(matches!(err, AudioError::DeviceNotFound(_)));
    }

    #[tokio::test]
    async fn test_unplugged_after_listing_is_not_found() {
        let (fake, switcher) = switcher(two_devices());

        let listed = switcher.registry().list_devices().await.unwrap();
        fake.unplug("B");

        let err = switcher.set_default_device(&listed[1].id).await.unwrap_err();
        assert!(matches!(err, AudioError::DeviceNotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_external_change_fails_verification() {
        let fake = FakeAudioSystem::with_devices(
            &[("A", "Alpha", true), ("B", "Beta", true), ("C", "Gamma", true)],
            Some("A"),
        );
        fake.hijack_switches("C", 2);
        let (fake, switcher) = switcher(fake);

        let err = switcher.set_default_device(&DeviceId::from("B")).await.unwrap_err();
        assert_eq!(
            err,
            AudioError::SwitchVerification {
                requested: DeviceId::from("B"),
                actual: Some(DeviceId::from("C")),
            }
        );
        assert_eq!(fake.switch_count(), 2);
    }

    #[tokio::test]
    async fn test_single_verification_miss_recovers_on_retry() {
        let fake = FakeAudioSystem::with_devices(
            &[("A", "Alpha", true), ("B", "Beta", true), ("C", "Gamma", true)],
            Some("A"),
        );
        fake.hijack_switches("C", 1);
        let (fake, switcher) = switcher(fake);

        let info = switcher.set_default_device(&DeviceId::from("B")).await.unwrap();
        assert_eq!(info.id, DeviceId::from("B"));
        assert_eq!(fake.default_id(), Some(DeviceId::from("B")));
    }

    #[tokio::test]
    async fn test_ignored_request_fails_verification() {
        let fake = two_devices();
        fake.ignore_switches();
        let (fake, switcher) = switcher(fake);

        let err = switcher.set_default_device(&DeviceId::from("B")).await.unwrap_err();
        assert!(matches!(err, AudioError::SwitchVerification { .. }));
        assert_eq!(fake.default_id(), Some(DeviceId::from("A")));
    }

    #[tokio::test]
    async fn test_rejection_is_distinct_and_not_retried() {
        let fake = two_devices();
        fake.reject_switches("disabled by policy");
        let (fake, switcher) = switcher(fake);

        let err = switcher.set_default_device(&DeviceId::from("B")).await.unwrap_err();
        assert_eq!(
            err,
            AudioError::SwitchRejected {
                id: DeviceId::from("B"),
                reason: "disabled by policy".to_string(),
            }
        );
        assert_eq!(fake.switch_count(), 1);
        assert_eq!(fake.default_id(), Some(DeviceId::from("A")));
    }

    #[tokio::test]
    async fn test_slow_switch_times_out() {
        let fake = Arc::new(two_devices());
        fake.set_switch_delay(Duration::from_millis(300));
        let registry = DeviceRegistry::with_timeout(Arc::clone(&fake), Duration::from_secs(2));
        let switcher = DefaultSwitcher::with_timeout(registry, Duration::from_millis(20));

        let err = switcher.set_default_device(&DeviceId::from("B")).await.unwrap_err();
        assert!(matches!(
            err,
            AudioError::OperationTimeout {
                operation: "set default input",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_switches_never_interleave() {
        let fake = FakeAudioSystem::with_devices(
            &[("A", "Alpha", true), ("B", "Beta", true), ("C", "Gamma", true)],
            Some("A"),
        );
        fake.set_switch_delay(Duration::from_millis(50));
        let (fake, switcher) = switcher(fake);

        let b = DeviceId::from("B");
        let c = DeviceId::from("C");
        let (first, second) = tokio::join!(
            switcher.set_default_device(&b),
            switcher.set_default_device(&c)
        );

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(fake.switch_count(), 2);
        assert_eq!(fake.max_concurrent_switches(), 1);
    }

    #[tokio::test]
    async fn test_switch_to_name() {
        let (_, switcher) = switcher(two_devices());

        let info = switcher.switch_to_name("beta").await.unwrap();
        assert_eq!(info.id, DeviceId::from("B"));

        let err = switcher.switch_to_name("Headset").await.unwrap_err();
        assert!(matches!(err, AudioError::DeviceNotFound(_)));
    }

    #[tokio::test]
    async fn test_cycle_next_wraps() {
        let (_, switcher) = switcher(two_devices());

        assert_eq!(switcher.cycle_next().await.unwrap().id, DeviceId::from("B"));
        assert_eq!(switcher.cycle_next().await.unwrap().id, DeviceId::from("A"));
    }

    #[tokio::test]
    async fn test_cycle_next_without_devices() {
        let (_, switcher) = switcher(FakeAudioSystem::new());
        assert_eq!(
            switcher.cycle_next().await.unwrap_err(),
            AudioError::NoAvailableDevice
        );
    }

    #[tokio::test]
    async fn test_timed_out_switch_still_blocks_the_next_one() {
        let fake = Arc::new(FakeAudioSystem::with_devices(
            &[("A", "Alpha", true), ("B", "Beta", true), ("C", "Gamma", true)],
            Some("A"),
        ));
        fake.set_switch_delay(Duration::from_millis(300));
        let registry = DeviceRegistry::with_timeout(Arc::clone(&fake), Duration::from_secs(2));
        let switcher = DefaultSwitcher::with_timeout(registry, Duration::from_millis(50));

        let first = switcher.set_default_device(&DeviceId::from("B")).await;
        let second = switcher.set_default_device(&DeviceId::from("C")).await;
        assert!(matches!(first, Err(AudioError::OperationTimeout { .. })));
        assert!(matches!(second, Err(AudioError::OperationTimeout { .. })));

        // Let the abandoned OS call finish before inspecting the fake.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fake.switch_count(), 2);
        assert_eq!(fake.max_concurrent_switches(), 1);
        assert_eq!(fake.default_id(), Some(DeviceId::from("C")));
    }

    #[tokio::test]
    async fn test_follow_up_only_after_confirmed_switch() {
        let (fake, switcher) = switcher(two_devices());

        switcher.set_default_device(&DeviceId::from("A")).await.unwrap();
        assert_eq!(fake.after_switch_count(), 0);

        switcher.set_default_device(&DeviceId::from("B")).await.unwrap();
        assert_eq!(fake.after_switch_count(), 1);

        fake.ignore_switches();
        switcher.set_default_device(&DeviceId::from("A")).await.unwrap_err();
        assert_eq!(fake.after_switch_count(), 1);
    }

    #[tokio::test]
    async fn test_slow_follow_up_does_not_fail_switch() {
        let fake = Arc::new(two_devices());
        fake.set_after_switch_delay(Duration::from_millis(300));
        let registry = DeviceRegistry::with_timeout(Arc::clone(&fake), Duration::from_secs(2));
        let switcher = DefaultSwitcher::with_timeout(registry, Duration::from_millis(50));

        let info = switcher.set_default_device(&DeviceId::from("B")).await.unwrap();
        assert_eq!(info.id, DeviceId::from("B"));

        // The next switch waits for the follow-up to finish.
        let info = switcher.set_default_device(&DeviceId::from("A")).await.unwrap();
        assert_eq!(info.id, DeviceId::from("A"));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(fake.max_concurrent_switches(), 1);
    }

    #[tokio::test]
    async fn test_failed_follow_up_keeps_switch() {
        let fake = two_devices();
        fake.fail_after_switch(AudioError::unavailable("stream move failed"));
        let (fake, switcher) = switcher(fake);

        let info = switcher.set_default_device(&DeviceId::from("B")).await.unwrap();
        assert_eq!(info.id, DeviceId::from("B"));
        assert_eq!(fake.after_switch_count(), 1);
    }
}
