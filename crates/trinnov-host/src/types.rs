//! Common types of the host contract.
//!
//! This module defines accessory identities and categories, the service and
//! characteristic types the platform uses, and the value type exchanged through
//! characteristic handlers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// `SleepDiscoveryMode` value: the television stays discoverable while asleep.
pub const SLEEP_DISCOVERY_ALWAYS_DISCOVERABLE: i64 = 1;

/// `VolumeControlType` value: the speaker accepts absolute volume levels.
pub const VOLUME_CONTROL_ABSOLUTE: i64 = 3;

/// Deterministic identity of an accessory.
///
/// Derived from a device's unique identifier with a name-based (v5) UUID, so
/// the host can match a freshly discovered device with the accessory it cached
/// on a previous run.
///
/// # Examples
///
/// ```
/// use trinnov_host::AccessoryUuid;
///
/// let a = AccessoryUuid::generate("ABCD");
/// let b = AccessoryUuid::generate("ABCD");
/// assert_eq!(a, b);
/// assert_ne!(a, AccessoryUuid::generate("EFGH"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessoryUuid(Uuid);

impl AccessoryUuid {
    /// Namespace all accessory identities are generated in.
    const NAMESPACE: Uuid = Uuid::NAMESPACE_OID;

    /// Generate the identity for a device unique id.
    pub fn generate(seed: &str) -> Self {
        Self(Uuid::new_v5(&Self::NAMESPACE, seed.as_bytes()))
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AccessoryUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AccessoryUuid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Accessory category, which decides the icon and tile shown by the controller.
///
/// Discriminants match the HomeKit Accessory Protocol category identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
#[non_exhaustive]
pub enum Category {
    Other = 1,
    Bridge = 2,
    Speaker = 26,
    Television = 31,
    AudioReceiver = 34,
}

impl Category {
    /// Get the protocol identifier of the category.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Service (capability group) types used by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ServiceType {
    /// Manufacturer, model and serial number. Present on every accessory.
    AccessoryInformation,

    /// Media player: power and input selection.
    Television,

    /// Speaker attached to a television: mute and volume.
    TelevisionSpeaker,

    /// Dimmable light.
    Lightbulb,

    /// Motion sensor.
    MotionSensor,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AccessoryInformation => "AccessoryInformation",
            Self::Television => "Television",
            Self::TelevisionSpeaker => "TelevisionSpeaker",
            Self::Lightbulb => "Lightbulb",
            Self::MotionSensor => "MotionSensor",
        };
        write!(f, "{name}")
    }
}

/// Characteristic types used by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CharacteristicType {
    Name,
    Manufacturer,
    Model,
    SerialNumber,
    FirmwareRevision,
    ConfiguredName,
    SleepDiscoveryMode,
    Active,
    ActiveIdentifier,
    Mute,
    Volume,
    VolumeControlType,
    MotionDetected,
    On,
    Brightness,
}

impl CharacteristicType {
    /// Value a characteristic holds before anything writes to it.
    pub fn default_value(&self) -> CharacteristicValue {
        match self {
            Self::Name
            | Self::Manufacturer
            | Self::Model
            | Self::SerialNumber
            | Self::FirmwareRevision
            | Self::ConfiguredName => CharacteristicValue::String(String::new()),
            Self::ActiveIdentifier => CharacteristicValue::String(String::new()),
            Self::Active | Self::Mute | Self::MotionDetected | Self::On => {
                CharacteristicValue::Bool(false)
            }
            Self::SleepDiscoveryMode
            | Self::Volume
            | Self::VolumeControlType
            | Self::Brightness => CharacteristicValue::Int(0),
        }
    }
}

impl fmt::Display for CharacteristicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Value carried by a characteristic.
///
/// Serialized untagged, so JSON `true`, `42` and `"HDMI 1"` map directly onto
/// the three variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl CharacteristicValue {
    /// Interpret the value as a boolean.
    ///
    /// Integers are accepted as well (non-zero is `true`), since power-like
    /// characteristics are exchanged as `0`/`1` by most controllers.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::String(_) => None,
        }
    }

    /// Get the value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for CharacteristicValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for CharacteristicValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for CharacteristicValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Notification that a characteristic value was pushed by the accessory.
///
/// Sent for every `update_characteristic` call, which is how accessories
/// report state changes the controller did not ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicEvent {
    /// Accessory the characteristic belongs to.
    pub accessory: AccessoryUuid,

    /// Service the characteristic belongs to.
    pub service: ServiceType,

    /// Subtype of the service, when the accessory has several of that type.
    pub subtype: Option<String>,

    /// Characteristic that changed.
    pub characteristic: CharacteristicType,

    /// New value.
    pub value: CharacteristicValue,
}
