//! Accessory adapter.
//!
//! A [`TrinnovAccessory`] binds one host accessory to an in-memory state bag:
//! it fills in the accessory information, makes sure the television, speaker
//! and motion sensor services exist, installs characteristic handlers and runs
//! the motion demo for as long as it lives.
//!
//! # Examples
//!
//! ```
//! use trinnov_core::DeviceDescriptor;
//! use trinnov_host::{
//!     AccessoryHandle, AccessoryUuid, Category, CharacteristicType, CharacteristicValue,
//!     PlatformAccessory, ServiceType,
//! };
//! use trinnov_platform::{AccessoryOptions, TrinnovAccessory};
//!
//! #[tokio::main]
//! async fn main() -> trinnov_platform::Result<()> {
//!     let device = DeviceDescriptor::new("ABCD", "Bedroom");
//!     let mut accessory = PlatformAccessory::new(
//!         "Bedroom",
//!         AccessoryUuid::generate(&device.unique_id),
//!         Category::AudioReceiver,
//!     );
//!     device.store_in(accessory.context_mut())?;
//!
//!     let handle = AccessoryHandle::new(accessory);
//!     let mut adapter = TrinnovAccessory::new(handle.clone(), &AccessoryOptions::default())?;
//!
//!     handle.with(|a| {
//!         a.handle_set(
//!             ServiceType::TelevisionSpeaker,
//!             None,
//!             CharacteristicType::Volume,
//!             CharacteristicValue::Int(42),
//!         )
//!     })?;
//!     assert_eq!(adapter.get_volume()?, CharacteristicValue::Int(42));
//!
//!     adapter.stop().await;
//!     Ok(())
//! }
//! ```

use crate::demo::MotionDemo;
use crate::error::{PlatformError, Result};
use crate::state::{AccessoryState, HandlerResult, SharedState};
use std::time::Duration;
use tracing::debug;
use trinnov_core::DeviceDescriptor;
use trinnov_core::constants::{
    DEFAULT_SERIAL_NUMBER, MANUFACTURER, MODEL, MOTION_SENSOR_ONE_NAME, MOTION_SENSOR_ONE_SUBTYPE,
    MOTION_SENSOR_TWO_NAME, MOTION_SENSOR_TWO_SUBTYPE, MOTION_TOGGLE_INTERVAL,
};
use trinnov_host::{
    AccessoryHandle, AccessoryUuid, CharacteristicType, CharacteristicValue, PlatformAccessory,
    SLEEP_DISCOVERY_ALWAYS_DISCOVERABLE, ServiceType, VOLUME_CONTROL_ABSOLUTE,
};

/// Settings shared by every adapter of a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryOptions {
    /// Period of the demo motion toggle.
    pub motion_interval: Duration,

    /// Firmware revision reported in the accessory information.
    pub firmware_revision: String,
}

impl Default for AccessoryOptions {
    fn default() -> Self {
        Self {
            motion_interval: MOTION_TOGGLE_INTERVAL,
            firmware_revision: crate::VERSION.to_string(),
        }
    }
}

/// Adapter between a host accessory and the Trinnov state bag.
#[derive(Debug)]
pub struct TrinnovAccessory {
    accessory: AccessoryHandle,
    device: DeviceDescriptor,
    state: SharedState,
    demo: MotionDemo,
}

impl TrinnovAccessory {
    /// Configure an accessory and start its motion demo.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::MissingDeviceContext` if the accessory context
    /// carries no device descriptor.
    pub fn new(accessory: AccessoryHandle, options: &AccessoryOptions) -> Result<Self> {
        let device = accessory
            .with(|a| DeviceDescriptor::from_context(a.context()))
            .map_err(|e| PlatformError::missing_device_context(accessory.display_name(), e))?;

        let state = SharedState::new();
        accessory.with(|a| {
            Self::configure_information(a, options);
            Self::configure_television(a, &device, &state);
            Self::configure_speaker(a, &device, &state);
            Self::configure_motion_sensors(a);
        });

        debug!("Configured accessory {}", device);
        let demo = MotionDemo::start(accessory.clone(), options.motion_interval);

        Ok(Self {
            accessory,
            device,
            state,
            demo,
        })
    }

    fn configure_information(accessory: &mut PlatformAccessory, options: &AccessoryOptions) {
        let name = accessory.display_name().to_string();
        accessory
            .get_or_add_service(ServiceType::AccessoryInformation, name, None)
            .set_characteristic(CharacteristicType::Manufacturer, MANUFACTURER)
            .set_characteristic(CharacteristicType::Model, MODEL)
            .set_characteristic(CharacteristicType::SerialNumber, DEFAULT_SERIAL_NUMBER)
            .set_characteristic(
                CharacteristicType::FirmwareRevision,
                options.firmware_revision.as_str(),
            );
    }

    fn configure_television(
        accessory: &mut PlatformAccessory,
        device: &DeviceDescriptor,
        state: &SharedState,
    ) {
        let television = accessory
            .get_or_add_service(ServiceType::Television, device.display_name.as_str(), None)
            .set_characteristic(CharacteristicType::ConfiguredName, device.display_name.as_str())
            .set_characteristic(
                CharacteristicType::SleepDiscoveryMode,
                SLEEP_DISCOVERY_ALWAYS_DISCOVERABLE,
            );

        let (get, set) = (state.clone(), state.clone());
        television
            .get_characteristic(CharacteristicType::Active)
            .on_get(move || get.get_power_state())
            .on_set(move |value| set.set_power_state(value));

        let (get, set) = (state.clone(), state.clone());
        television
            .get_characteristic(CharacteristicType::ActiveIdentifier)
            .on_get(move || get.get_input_state())
            .on_set(move |value| set.set_input_state(value));
    }

    fn configure_speaker(
        accessory: &mut PlatformAccessory,
        device: &DeviceDescriptor,
        state: &SharedState,
    ) {
        let speaker = accessory
            .get_or_add_service(ServiceType::TelevisionSpeaker, device.display_name.as_str(), None)
            .set_characteristic(CharacteristicType::VolumeControlType, VOLUME_CONTROL_ABSOLUTE);

        let (get, set) = (state.clone(), state.clone());
        speaker
            .get_characteristic(CharacteristicType::Mute)
            .on_get(move || get.get_mute())
            .on_set(move |value| set.set_mute(value));

        let (get, set) = (state.clone(), state.clone());
        speaker
            .get_characteristic(CharacteristicType::Volume)
            .on_get(move || get.get_volume())
            .on_set(move |value| set.set_volume(value));
    }

    fn configure_motion_sensors(accessory: &mut PlatformAccessory) {
        if accessory.remove_service(ServiceType::Lightbulb, None).is_some() {
            debug!("Removed light service from {}", accessory.display_name());
        }

        for (name, subtype, initial) in [
            (MOTION_SENSOR_ONE_NAME, MOTION_SENSOR_ONE_SUBTYPE, false),
            (MOTION_SENSOR_TWO_NAME, MOTION_SENSOR_TWO_SUBTYPE, true),
        ] {
            accessory
                .get_or_add_service(ServiceType::MotionSensor, name, Some(subtype))
                .set_characteristic(CharacteristicType::MotionDetected, initial);
        }
    }

    /// Get the host accessory this adapter drives.
    pub fn accessory(&self) -> &AccessoryHandle {
        &self.accessory
    }

    /// Get the accessory identity.
    pub fn uuid(&self) -> AccessoryUuid {
        self.accessory.uuid()
    }

    /// Get the device this accessory was created for.
    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    /// Copy the current state bag.
    pub fn state(&self) -> AccessoryState {
        self.state.snapshot()
    }

    /// Check whether the motion demo is still running.
    pub fn is_running(&self) -> bool {
        self.demo.is_running()
    }

    /// Stop the motion demo and wait for it to finish.
    pub async fn stop(&mut self) {
        self.demo.stop().await;
    }

    pub fn set_power_state(&self, value: CharacteristicValue) -> HandlerResult<()> {
        self.state.set_power_state(value)
    }

    pub fn get_power_state(&self) -> HandlerResult<CharacteristicValue> {
        self.state.get_power_state()
    }

    pub fn set_input_state(&self, value: CharacteristicValue) -> HandlerResult<()> {
        self.state.set_input_state(value)
    }

    pub fn get_input_state(&self) -> HandlerResult<CharacteristicValue> {
        self.state.get_input_state()
    }

    pub fn set_mute(&self, value: CharacteristicValue) -> HandlerResult<()> {
        self.state.set_mute(value)
    }

    pub fn get_mute(&self) -> HandlerResult<CharacteristicValue> {
        self.state.get_mute()
    }

    pub fn set_volume(&self, value: CharacteristicValue) -> HandlerResult<()> {
        self.state.set_volume(value)
    }

    pub fn get_volume(&self) -> HandlerResult<CharacteristicValue> {
        self.state.get_volume()
    }

    /// Light handlers. The light service is removed by the demo setup, so
    /// these are only reachable through the adapter.
    pub fn set_on(&self, value: CharacteristicValue) -> HandlerResult<()> {
        self.state.set_on(value)
    }

    pub fn get_on(&self) -> HandlerResult<CharacteristicValue> {
        self.state.get_on()
    }

    pub fn set_brightness(&self, value: CharacteristicValue) -> HandlerResult<()> {
        self.state.set_brightness(value)
    }

    pub fn get_brightness(&self) -> HandlerResult<CharacteristicValue> {
        self.state.get_brightness()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trinnov_host::{Category, HostError};

    fn handle(device: &DeviceDescriptor) -> AccessoryHandle {
        let mut accessory = PlatformAccessory::new(
            device.display_name.as_str(),
            AccessoryUuid::generate(&device.unique_id),
            Category::AudioReceiver,
        );
        device.store_in(accessory.context_mut()).unwrap();
        AccessoryHandle::new(accessory)
    }

    fn string(value: &str) -> Option<CharacteristicValue> {
        Some(CharacteristicValue::String(value.to_string()))
    }

    #[tokio::test]
    async fn test_missing_context_fails() {
        let accessory = AccessoryHandle::new(PlatformAccessory::new(
            "Bare",
            AccessoryUuid::generate("bare"),
            Category::AudioReceiver,
        ));

        let result = TrinnovAccessory::new(accessory, &AccessoryOptions::default());
        assert!(matches!(
            result,
            Err(PlatformError::MissingDeviceContext { .. })
        ));
    }

    #[tokio::test]
    async fn test_information_service() {
        let accessory = handle(&DeviceDescriptor::new("ABCD", "Bedroom"));
        let _adapter =
            TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();

        accessory.with(|a| {
            let info = a.get_service(ServiceType::AccessoryInformation).unwrap();
            assert_eq!(info.value(CharacteristicType::Manufacturer).cloned(), string("Trinnov"));
            assert_eq!(info.value(CharacteristicType::Model).cloned(), string("Altitude"));
            assert_eq!(
                info.value(CharacteristicType::SerialNumber).cloned(),
                string("Default-Serial")
            );
            assert_eq!(
                info.value(CharacteristicType::FirmwareRevision).cloned(),
                string(crate::VERSION)
            );
        });
    }

    #[tokio::test]
    async fn test_television_service() {
        let accessory = handle(&DeviceDescriptor::new("ABCD", "Bedroom"));
        let _adapter =
            TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();

        accessory.with(|a| {
            let tv = a.get_service(ServiceType::Television).unwrap();
            assert_eq!(tv.value(CharacteristicType::ConfiguredName).cloned(), string("Bedroom"));
            assert_eq!(
                tv.value(CharacteristicType::SleepDiscoveryMode),
                Some(&CharacteristicValue::Int(1))
            );
            assert!(tv.characteristic(CharacteristicType::Active).unwrap().has_get_handler());
            assert!(
                tv.characteristic(CharacteristicType::ActiveIdentifier)
                    .unwrap()
                    .has_set_handler()
            );
        });
    }

    #[tokio::test]
    async fn test_speaker_mute_has_get_and_set() {
        let accessory = handle(&DeviceDescriptor::new("ABCD", "Bedroom"));
        let _adapter =
            TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();

        accessory.with(|a| {
            let speaker = a.get_service(ServiceType::TelevisionSpeaker).unwrap();
            let mute = speaker.characteristic(CharacteristicType::Mute).unwrap();
            assert!(mute.has_get_handler());
            assert!(mute.has_set_handler());
            assert_eq!(
                speaker.value(CharacteristicType::VolumeControlType),
                Some(&CharacteristicValue::Int(3))
            );
        });
    }

    #[tokio::test]
    async fn test_lightbulb_removed_and_sensors_added() {
        let accessory = handle(&DeviceDescriptor::new("ABCD", "Bedroom"));
        accessory.with(|a| {
            a.get_or_add_service(ServiceType::Lightbulb, "Light", None);
        });

        let _adapter =
            TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();

        accessory.with(|a| {
            assert!(a.get_service(ServiceType::Lightbulb).is_none());

            let one = a.get_service_by_name(MOTION_SENSOR_ONE_NAME).unwrap();
            assert_eq!(one.subtype(), Some(MOTION_SENSOR_ONE_SUBTYPE));
            assert_eq!(
                one.value(CharacteristicType::MotionDetected),
                Some(&CharacteristicValue::Bool(false))
            );

            let two = a.get_service_by_name(MOTION_SENSOR_TWO_SUBTYPE).unwrap();
            assert_eq!(
                two.value(CharacteristicType::MotionDetected),
                Some(&CharacteristicValue::Bool(true))
            );
        });
    }

    #[tokio::test]
    async fn test_reconfigure_does_not_duplicate_services() {
        let accessory = handle(&DeviceDescriptor::new("ABCD", "Bedroom"));
        let mut first =
            TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();
        first.stop().await;
        let count = accessory.with(|a| a.services().count());

        let _second =
            TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();
        assert_eq!(accessory.with(|a| a.services().count()), count);
        assert_eq!(count, 5);
    }

    #[tokio::test]
    async fn test_host_requests_reach_state() {
        let accessory = handle(&DeviceDescriptor::new("ABCD", "Bedroom"));
        let adapter =
            TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();

        accessory
            .with(|a| {
                a.handle_set(
                    ServiceType::Television,
                    None,
                    CharacteristicType::ActiveIdentifier,
                    CharacteristicValue::Int(3),
                )
            })
            .unwrap();
        accessory
            .with(|a| {
                a.handle_set(
                    ServiceType::TelevisionSpeaker,
                    None,
                    CharacteristicType::Mute,
                    CharacteristicValue::Bool(true),
                )
            })
            .unwrap();

        let state = adapter.state();
        assert_eq!(state.input, CharacteristicValue::Int(3));
        assert!(state.is_muted());

        let input = accessory
            .with(|a| {
                a.handle_get(ServiceType::Television, None, CharacteristicType::ActiveIdentifier)
            })
            .unwrap();
        assert_eq!(input, CharacteristicValue::Int(3));

        let power = accessory
            .with(|a| a.handle_get(ServiceType::Television, None, CharacteristicType::Active))
            .unwrap();
        assert_eq!(power, CharacteristicValue::Bool(true));
    }

    #[tokio::test]
    async fn test_power_reads_back_as_written() {
        let accessory = handle(&DeviceDescriptor::new("ABCD", "Bedroom"));
        let adapter =
            TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();

        accessory
            .with(|a| {
                a.handle_set(
                    ServiceType::Television,
                    None,
                    CharacteristicType::Active,
                    CharacteristicValue::Int(0),
                )
            })
            .unwrap();

        let power = accessory
            .with(|a| a.handle_get(ServiceType::Television, None, CharacteristicType::Active))
            .unwrap();
        assert_eq!(power, CharacteristicValue::Int(0));
        assert!(!adapter.state().is_powered());
    }

    #[tokio::test]
    async fn test_rejected_value_reaches_host() {
        let accessory = handle(&DeviceDescriptor::new("ABCD", "Bedroom"));
        let adapter =
            TrinnovAccessory::new(accessory.clone(), &AccessoryOptions::default()).unwrap();

        let result = accessory.with(|a| {
            a.handle_set(
                ServiceType::TelevisionSpeaker,
                None,
                CharacteristicType::Volume,
                CharacteristicValue::String("loud".to_string()),
            )
        });

        assert!(matches!(result, Err(HostError::UnsupportedValue { .. })));
        assert_eq!(adapter.state().volume, 100);
    }

    #[tokio::test]
    async fn test_adapter_handler_round_trips() {
        let accessory = handle(&DeviceDescriptor::new("ABCD", "Bedroom"));
        let adapter = TrinnovAccessory::new(accessory, &AccessoryOptions::default()).unwrap();

        adapter.set_power_state(CharacteristicValue::Bool(false)).unwrap();
        adapter.set_input_state("HDMI 2".into()).unwrap();
        adapter.set_volume(CharacteristicValue::Int(42)).unwrap();
        adapter.set_on(CharacteristicValue::Int(0)).unwrap();
        adapter.set_brightness(CharacteristicValue::Int(5)).unwrap();

        assert_eq!(adapter.get_power_state().unwrap(), CharacteristicValue::Bool(false));
        assert_eq!(adapter.get_input_state().unwrap(), CharacteristicValue::from("HDMI 2"));
        assert_eq!(adapter.get_volume().unwrap(), CharacteristicValue::Int(42));
        assert_eq!(adapter.get_mute().unwrap(), CharacteristicValue::Bool(false));
        assert_eq!(adapter.get_on().unwrap(), CharacteristicValue::Int(0));
        assert_eq!(adapter.get_brightness().unwrap(), CharacteristicValue::Int(5));
        assert_eq!(adapter.device().unique_id, "ABCD");
    }
}
