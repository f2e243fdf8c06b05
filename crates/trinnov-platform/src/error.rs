//! Error types for the Trinnov platform.

use trinnov_host::HostError;

/// Result type alias for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Errors raised by the platform controller and accessory adapters.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] trinnov_core::Error),

    /// A host call failed.
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// The accessory context carries no usable device descriptor.
    #[error("Accessory {accessory} has no device descriptor in its context: {reason}")]
    MissingDeviceContext { accessory: String, reason: String },

    /// The launch hook ran more than once.
    #[error("Platform already launched")]
    AlreadyLaunched,
}

impl PlatformError {
    /// Create a new missing device context error.
    pub fn missing_device_context(accessory: impl Into<String>, reason: impl ToString) -> Self {
        Self::MissingDeviceContext {
            accessory: accessory.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trinnov_host::AccessoryUuid;

    #[test]
    fn test_from_host_error() {
        let error: PlatformError =
            HostError::unknown_accessory(AccessoryUuid::generate("ABCD")).into();
        assert!(matches!(error, PlatformError::Host(_)));
    }

    #[test]
    fn test_from_config_error() {
        let error: PlatformError =
            trinnov_core::Error::MissingField("macaddress".to_string()).into();
        assert_eq!(
            error.to_string(),
            "Configuration error: Missing configuration key: macaddress"
        );
    }

    #[test]
    fn test_missing_device_context_display() {
        let error = PlatformError::missing_device_context("Bedroom", "no device entry");
        assert_eq!(
            error.to_string(),
            "Accessory Bedroom has no device descriptor in its context: no device entry"
        );
    }
}
