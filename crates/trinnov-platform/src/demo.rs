//! Demo motion toggle.
//!
//! Every accessory carries two motion sensors whose values are flipped on a
//! fixed period, one always the negation of the other. The toggle runs in its
//! own task, tied to a cancellation token owned by the adapter.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use trinnov_core::constants::{MOTION_SENSOR_ONE_SUBTYPE, MOTION_SENSOR_TWO_SUBTYPE};
use trinnov_host::{AccessoryHandle, CharacteristicType, ServiceType};

/// Handle to a running motion toggle.
///
/// Dropping the handle cancels the task; [`stop`](Self::stop) also waits for
/// it to finish.
#[derive(Debug)]
pub struct MotionDemo {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MotionDemo {
    /// Spawn the toggle for an accessory.
    ///
    /// The first toggle happens one `period` after start. Must be called from
    /// within a Tokio runtime.
    pub fn start(accessory: AccessoryHandle, period: Duration) -> Self {
        let token = CancellationToken::new();
        let task = tokio::spawn(Self::run(accessory, period, token.clone()));

        Self {
            token,
            task: Some(task),
        }
    }

    /// Check whether the task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the task and wait for it to finish.
    pub async fn stop(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            warn!("Motion demo task failed: {}", e);
        }
    }

    async fn run(accessory: AccessoryHandle, period: Duration, token: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + period, period);
        let mut detected = false;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    detected = !detected;
                    push_motion(&accessory, detected);
                }
            }
        }

        debug!("Motion demo stopped for {}", accessory.uuid());
    }
}

impl Drop for MotionDemo {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Push `detected` to sensor one and its negation to sensor two.
pub(crate) fn push_motion(accessory: &AccessoryHandle, detected: bool) {
    accessory.with(|a| {
        for (subtype, value) in [
            (MOTION_SENSOR_ONE_SUBTYPE, detected),
            (MOTION_SENSOR_TWO_SUBTYPE, !detected),
        ] {
            match a.get_service_with_subtype(ServiceType::MotionSensor, Some(subtype)) {
                Some(sensor) => {
                    sensor.update_characteristic(CharacteristicType::MotionDetected, value);
                    debug!("Triggering {}: {}", subtype, value);
                }
                None => debug!("Motion sensor {} is gone, skipping", subtype),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use trinnov_host::{AccessoryUuid, Category, CharacteristicValue, PlatformAccessory};

    fn accessory_with_sensors() -> AccessoryHandle {
        let mut accessory = PlatformAccessory::new(
            "Bedroom",
            AccessoryUuid::generate("ABCD"),
            Category::AudioReceiver,
        );
        accessory
            .get_or_add_service(ServiceType::MotionSensor, "One", Some(MOTION_SENSOR_ONE_SUBTYPE))
            .set_characteristic(CharacteristicType::MotionDetected, false);
        accessory
            .get_or_add_service(ServiceType::MotionSensor, "Two", Some(MOTION_SENSOR_TWO_SUBTYPE))
            .set_characteristic(CharacteristicType::MotionDetected, true);
        AccessoryHandle::new(accessory)
    }

    fn sensor_value(accessory: &AccessoryHandle, subtype: &str) -> Option<CharacteristicValue> {
        accessory.with(|a| {
            a.get_service_with_subtype(ServiceType::MotionSensor, Some(subtype))
                .and_then(|s| s.value(CharacteristicType::MotionDetected).cloned())
        })
    }

    #[test]
    fn test_push_motion_is_complementary() {
        let accessory = accessory_with_sensors();

        push_motion(&accessory, true);

        assert_eq!(
            sensor_value(&accessory, MOTION_SENSOR_ONE_SUBTYPE),
            Some(CharacteristicValue::Bool(true))
        );
        assert_eq!(
            sensor_value(&accessory, MOTION_SENSOR_TWO_SUBTYPE),
            Some(CharacteristicValue::Bool(false))
        );
    }

    #[test]
    fn test_push_motion_skips_missing_sensor() {
        let accessory = accessory_with_sensors();
        accessory.with(|a| {
            a.remove_service(ServiceType::MotionSensor, Some(MOTION_SENSOR_TWO_SUBTYPE));
        });

        push_motion(&accessory, true);

        assert_eq!(
            sensor_value(&accessory, MOTION_SENSOR_ONE_SUBTYPE),
            Some(CharacteristicValue::Bool(true))
        );
        assert_eq!(sensor_value(&accessory, MOTION_SENSOR_TWO_SUBTYPE), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_toggle_after_one_period() {
        let accessory = accessory_with_sensors();
        let mut rx = accessory.subscribe();
        let mut demo = MotionDemo::start(accessory.clone(), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let first = rx.recv().await.unwrap();
        assert_eq!(first.subtype.as_deref(), Some(MOTION_SENSOR_ONE_SUBTYPE));
        assert_eq!(first.value, CharacteristicValue::Bool(true));

        demo.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_task() {
        let accessory = accessory_with_sensors();
        let mut demo = MotionDemo::start(accessory.clone(), Duration::from_secs(10));
        assert!(demo.is_running());

        demo.stop().await;
        assert!(!demo.is_running());

        let mut rx = accessory.subscribe();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_task() {
        let accessory = accessory_with_sensors();
        let demo = MotionDemo::start(accessory.clone(), Duration::from_secs(10));
        let mut rx = accessory.subscribe();

        drop(demo);
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(rx.try_recv().is_err());
    }
}
