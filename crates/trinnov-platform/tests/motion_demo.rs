//! Integration tests for the demo motion sensors, run on paused time.
//!
//! Run with: cargo test --package trinnov-platform --test motion_demo

use std::time::Duration;
use trinnov_core::constants::{MOTION_SENSOR_ONE_SUBTYPE, MOTION_SENSOR_TWO_SUBTYPE};
use trinnov_core::{DeviceDescriptor, MacAddress, PlatformConfig};
use trinnov_host::{
    AccessoryHandle, AccessoryUuid, Category, CharacteristicType, CharacteristicValue, MockHost,
    PlatformAccessory, ServiceType,
};
use trinnov_platform::{AccessoryOptions, TrinnovAccessory, TrinnovPlatform};

const PERIOD: Duration = Duration::from_secs(10);

fn accessory() -> AccessoryHandle {
    let device = DeviceDescriptor::new("ABCD", "Bedroom");
    let mut accessory = PlatformAccessory::new(
        "Bedroom",
        AccessoryUuid::generate(&device.unique_id),
        Category::AudioReceiver,
    );
    device.store_in(accessory.context_mut()).unwrap();
    AccessoryHandle::new(accessory)
}

fn motion(accessory: &AccessoryHandle, subtype: &str) -> bool {
    accessory.with(|a| {
        a.get_service_with_subtype(ServiceType::MotionSensor, Some(subtype))
            .and_then(|s| s.value(CharacteristicType::MotionDetected).cloned())
            .and_then(|v| v.as_bool())
            .unwrap()
    })
}

#[tokio::test(start_paused = true)]
async fn test_sensors_stay_complementary() {
    let accessory = accessory();
    let mut adapter =
        TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();

    assert!(!motion(&accessory, MOTION_SENSOR_ONE_SUBTYPE));
    assert!(motion(&accessory, MOTION_SENSOR_TWO_SUBTYPE));

    let mut rx = accessory.subscribe();
    let mut expected = false;
    for _ in 0..5 {
        expected = !expected;

        let one = rx.recv().await.unwrap();
        let two = rx.recv().await.unwrap();
        assert_eq!(one.subtype.as_deref(), Some(MOTION_SENSOR_ONE_SUBTYPE));
        assert_eq!(one.value, CharacteristicValue::Bool(expected));
        assert_eq!(two.subtype.as_deref(), Some(MOTION_SENSOR_TWO_SUBTYPE));
        assert_eq!(two.value, CharacteristicValue::Bool(!expected));

        assert_ne!(
            motion(&accessory, MOTION_SENSOR_ONE_SUBTYPE),
            motion(&accessory, MOTION_SENSOR_TWO_SUBTYPE)
        );
    }

    adapter.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_toggle_follows_interval() {
    let accessory = accessory();
    let options = AccessoryOptions {
        motion_interval: Duration::from_secs(3),
        ..Default::default()
    };
    let mut adapter = TrinnovAccessory::new(accessory.clone(), &options).unwrap();
    let mut rx = accessory.subscribe();

    let start = tokio::time::Instant::now();
    rx.recv().await.unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));

    adapter.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_dropped_adapter_stops_toggling() {
    let accessory = accessory();
    let adapter = TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();
    let mut rx = accessory.subscribe();

    tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;
    assert!(rx.try_recv().is_ok());
    while rx.try_recv().is_ok() {}

    drop(adapter);
    tokio::time::sleep(PERIOD * 5).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_platform_shutdown_stops_every_demo() {
    let (host, handle) = MockHost::new();
    let mut platform =
        TrinnovPlatform::new(host, PlatformConfig::new(MacAddress::new("AA:BB").unwrap()));
    platform.did_finish_launching().await.unwrap();

    let receivers: Vec<_> = handle
        .registered_uuids()
        .into_iter()
        .map(|uuid| handle.accessory(uuid).unwrap().subscribe())
        .collect();
    assert_eq!(receivers.len(), 4);

    platform.shutdown().await;
    tokio::time::sleep(PERIOD * 3).await;

    for mut rx in receivers {
        assert!(rx.try_recv().is_err());
    }
}
