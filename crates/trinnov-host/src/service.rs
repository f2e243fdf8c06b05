//! Services (capability groups) of an accessory.

use crate::characteristic::Characteristic;
use crate::types::{
    AccessoryUuid, CharacteristicEvent, CharacteristicType, CharacteristicValue, ServiceType,
};
use tokio::sync::broadcast;

/// Sender half of an accessory's event stream, shared by all of its services.
#[derive(Debug, Clone)]
pub(crate) struct Notifier {
    accessory: AccessoryUuid,
    tx: broadcast::Sender<CharacteristicEvent>,
}

impl Notifier {
    pub(crate) fn new(
        accessory: AccessoryUuid,
        tx: broadcast::Sender<CharacteristicEvent>,
    ) -> Self {
        Self { accessory, tx }
    }

    fn notify(
        &self,
        service: ServiceType,
        subtype: Option<&str>,
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    ) {
        // No subscribers is the normal case outside tests and live controllers.
        let _ = self.tx.send(CharacteristicEvent {
            accessory: self.accessory,
            service,
            subtype: subtype.map(str::to_string),
            characteristic,
            value,
        });
    }
}

/// A named bundle of characteristics on an accessory.
///
/// Services are created through the owning [`PlatformAccessory`], which makes
/// sure no two services share a type and subtype.
///
/// [`PlatformAccessory`]: crate::PlatformAccessory
#[derive(Debug, Clone)]
pub struct Service {
    kind: ServiceType,
    name: String,
    subtype: Option<String>,
    characteristics: Vec<Characteristic>,
    notifier: Notifier,
}

impl Service {
    pub(crate) fn new(
        kind: ServiceType,
        name: impl Into<String>,
        subtype: Option<String>,
        notifier: Notifier,
    ) -> Self {
        let name = name.into();
        let mut service = Self {
            kind,
            name: name.clone(),
            subtype,
            characteristics: Vec::new(),
            notifier,
        };
        service.set_characteristic(CharacteristicType::Name, name);
        service
    }

    /// Get the service type.
    pub fn kind(&self) -> ServiceType {
        self.kind
    }

    /// Get the service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the subtype distinguishing services of the same type.
    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    /// Check whether this service is the one identified by type and subtype.
    pub fn matches(&self, kind: ServiceType, subtype: Option<&str>) -> bool {
        self.kind == kind && self.subtype.as_deref() == subtype
    }

    /// Iterate over the characteristics in creation order.
    pub fn characteristics(&self) -> impl Iterator<Item = &Characteristic> {
        self.characteristics.iter()
    }

    /// Look up a characteristic without creating it.
    pub fn characteristic(&self, kind: CharacteristicType) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.kind() == kind)
    }

    /// Look up a characteristic mutably without creating it.
    pub fn characteristic_mut(&mut self, kind: CharacteristicType) -> Option<&mut Characteristic> {
        self.characteristics.iter_mut().find(|c| c.kind() == kind)
    }

    /// Get a characteristic, adding it with its default value if absent.
    pub fn get_characteristic(&mut self, kind: CharacteristicType) -> &mut Characteristic {
        let index = match self.characteristics.iter().position(|c| c.kind() == kind) {
            Some(index) => index,
            None => {
                self.characteristics.push(Characteristic::new(kind));
                self.characteristics.len() - 1
            }
        };
        &mut self.characteristics[index]
    }

    /// Get the cached value of a characteristic.
    pub fn value(&self, kind: CharacteristicType) -> Option<&CharacteristicValue> {
        self.characteristic(kind).map(Characteristic::value)
    }

    /// Store a value without running handlers or notifying subscribers.
    pub fn set_characteristic(
        &mut self,
        kind: CharacteristicType,
        value: impl Into<CharacteristicValue>,
    ) -> &mut Self {
        self.get_characteristic(kind).set_value(value);
        self
    }

    /// Store a value and push it to subscribers of the accessory.
    pub fn update_characteristic(
        &mut self,
        kind: CharacteristicType,
        value: impl Into<CharacteristicValue>,
    ) -> &mut Self {
        let value = value.into();
        self.get_characteristic(kind).set_value(value.clone());
        self.notifier.notify(self.kind, self.subtype.as_deref(), kind, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(
        kind: ServiceType,
        subtype: Option<&str>,
    ) -> (Service, broadcast::Receiver<CharacteristicEvent>) {
        let (tx, rx) = broadcast::channel(8);
        let notifier = Notifier::new(AccessoryUuid::generate("ABCD"), tx);
        (
            Service::new(kind, "Test", subtype.map(str::to_string), notifier),
            rx,
        )
    }

    #[test]
    fn test_new_sets_name_characteristic() {
        let (service, _rx) = service(ServiceType::Television, None);
        assert_eq!(service.name(), "Test");
        assert_eq!(
            service.value(CharacteristicType::Name),
            Some(&CharacteristicValue::String("Test".to_string()))
        );
    }

    #[test]
    fn test_get_characteristic_creates_once() {
        let (mut service, _rx) = service(ServiceType::TelevisionSpeaker, None);

        service.get_characteristic(CharacteristicType::Volume);
        service.get_characteristic(CharacteristicType::Volume);

        let count = service
            .characteristics()
            .filter(|c| c.kind() == CharacteristicType::Volume)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_characteristic_lookup_does_not_create() {
        let (mut service, _rx) = service(ServiceType::TelevisionSpeaker, None);
        assert!(service.characteristic(CharacteristicType::Mute).is_none());
        assert!(service.characteristic_mut(CharacteristicType::Mute).is_none());
    }

    #[test]
    fn test_set_characteristic_chains() {
        let (mut service, mut rx) = service(ServiceType::AccessoryInformation, None);

        service
            .set_characteristic(CharacteristicType::Manufacturer, "Trinnov")
            .set_characteristic(CharacteristicType::Model, "Altitude");

        assert_eq!(
            service.value(CharacteristicType::Model),
            Some(&CharacteristicValue::String("Altitude".to_string()))
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_update_characteristic_notifies() {
        let (mut service, mut rx) = service(ServiceType::MotionSensor, Some("sensor-1"));

        service.update_characteristic(CharacteristicType::MotionDetected, true);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.service, ServiceType::MotionSensor);
        assert_eq!(event.subtype.as_deref(), Some("sensor-1"));
        assert_eq!(event.characteristic, CharacteristicType::MotionDetected);
        assert_eq!(event.value, CharacteristicValue::Bool(true));
    }

    #[test]
    fn test_update_without_subscribers_is_ok() {
        let (mut service, rx) = service(ServiceType::MotionSensor, None);
        drop(rx);

        service.update_characteristic(CharacteristicType::MotionDetected, true);
        assert_eq!(
            service.value(CharacteristicType::MotionDetected),
            Some(&CharacteristicValue::Bool(true))
        );
    }

    #[test]
    fn test_matches() {
        let (service, _rx) = service(ServiceType::MotionSensor, Some("sensor-1"));
        assert!(service.matches(ServiceType::MotionSensor, Some("sensor-1")));
        assert!(!service.matches(ServiceType::MotionSensor, Some("sensor-2")));
        assert!(!service.matches(ServiceType::MotionSensor, None));
        assert!(!service.matches(ServiceType::Lightbulb, Some("sensor-1")));
    }
}
