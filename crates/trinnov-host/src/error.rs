//! Error types for host operations.
//!
//! This module defines the failures the host contract can report: registry
//! conflicts, missing services or characteristics, values a handler cannot
//! accept, and accessory cache problems.

use crate::types::{AccessoryUuid, CharacteristicType, CharacteristicValue, ServiceType};

/// Result type alias for host operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors that can occur while talking to the host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The host refused to register an accessory.
    #[error("Registration failed for accessory {uuid}: {reason}")]
    RegistrationFailed { uuid: AccessoryUuid, reason: String },

    /// No accessory with this identity is registered.
    #[error("Unknown accessory: {uuid}")]
    UnknownAccessory { uuid: AccessoryUuid },

    /// A service with the same type and subtype already exists on the accessory.
    #[error(
        "Service {service} with subtype {} already exists",
        .subtype.as_deref().unwrap_or("<none>")
    )]
    DuplicateService {
        service: ServiceType,
        subtype: Option<String>,
    },

    /// The accessory has no such service.
    #[error("Service not found: {service}")]
    ServiceNotFound { service: ServiceType },

    /// The service has no such characteristic.
    #[error("Characteristic not found: {characteristic}")]
    CharacteristicNotFound { characteristic: CharacteristicType },

    /// A handler received a value it cannot store.
    #[error("Unsupported value {value} for characteristic {characteristic}")]
    UnsupportedValue {
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    },

    /// The host lifecycle was started twice.
    #[error("Host already launched")]
    AlreadyLaunched,

    /// The accessory cache could not be read or written.
    #[error("Accessory cache error: {message}")]
    Cache { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HostError {
    /// Create a new registration failure.
    pub fn registration_failed(uuid: AccessoryUuid, reason: impl Into<String>) -> Self {
        Self::RegistrationFailed {
            uuid,
            reason: reason.into(),
        }
    }

    /// Create a new unknown accessory error.
    pub fn unknown_accessory(uuid: AccessoryUuid) -> Self {
        Self::UnknownAccessory { uuid }
    }

    /// Create a new unsupported value error.
    pub fn unsupported_value(
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    ) -> Self {
        Self::UnsupportedValue {
            characteristic,
            value,
        }
    }

    /// Create a new cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }
}
