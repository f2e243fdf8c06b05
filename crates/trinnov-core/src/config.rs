//! Platform configuration.
//!
//! The host hands every platform a free-form JSON block out of its config file.
//! This module turns the Trinnov block into a typed [`PlatformConfig`] and
//! rejects it up front when a required field is missing or malformed, instead of
//! letting undefined values flow into device identifiers.
//!
//! # Examples
//!
//! ```
//! use trinnov_core::PlatformConfig;
//! use serde_json::json;
//!
//! let config = PlatformConfig::from_value(&json!({
//!     "platform": "TrinnovPlatform",
//!     "macaddress": "aa:bb",
//! }))
//! .unwrap();
//!
//! assert_eq!(config.name, "Trinnov");
//! assert_eq!(config.mac_address.as_str(), "AA:BB");
//! ```

use crate::{
    Result,
    constants::{DEFAULT_PLATFORM_DISPLAY_NAME, MAX_MAC_GROUPS, MIN_MAC_GROUPS, PLATFORM_NAME},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// MAC address of the processor, as configured.
///
/// Accepts one to eight groups of two hex digits separated by `:` or `-`
/// (a single separator style per address). The value is trimmed and upper-cased
/// so the same processor always yields the same device identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Parse and normalize a MAC address.
    ///
    /// # Errors
    /// Returns `Error::InvalidMacAddress` if the value is empty, mixes
    /// separators, has the wrong number of groups, or a group is not exactly two
    /// hex digits.
    pub fn new(value: &str) -> Result<Self> {
        let normalized = value.trim().to_uppercase();
        let invalid = |reason: &str| Error::InvalidMacAddress {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if normalized.is_empty() {
            return Err(invalid("address is empty"));
        }

        let separator = match (normalized.contains(':'), normalized.contains('-')) {
            (true, true) => return Err(invalid("mixed ':' and '-' separators")),
            (false, true) => '-',
            _ => ':',
        };

        let groups: Vec<&str> = normalized.split(separator).collect();
        if !(MIN_MAC_GROUPS..=MAX_MAC_GROUPS).contains(&groups.len()) {
            return Err(invalid(&format!(
                "expected {MIN_MAC_GROUPS}-{MAX_MAC_GROUPS} groups, got {}",
                groups.len()
            )));
        }

        if let Some(bad) = groups
            .iter()
            .find(|g| g.len() != 2 || !g.chars().all(|c| c.is_ascii_hexdigit()))
        {
            return Err(invalid(&format!("group '{bad}' is not two hex digits")));
        }

        Ok(MacAddress(normalized))
    }

    /// Get the normalized address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MacAddress::new(s)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

/// Shape of the platform block as written by the user.
#[derive(Debug, Deserialize)]
struct RawPlatformConfig {
    platform: Option<String>,
    name: Option<String>,
    macaddress: Option<String>,
}

/// Shape of the host config file; only the platform list is read.
#[derive(Debug, Default, Deserialize)]
struct HostConfigFile {
    #[serde(default)]
    platforms: Vec<serde_json::Value>,
}

/// Validated configuration of the Trinnov platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Platform identifier the block was registered under.
    pub platform: String,

    /// Display name of the platform, also used for the MAC-derived devices.
    pub name: String,

    /// MAC address of the processor.
    pub mac_address: MacAddress,
}

impl PlatformConfig {
    /// Build a config for a MAC address with every other field defaulted.
    pub fn new(mac_address: MacAddress) -> Self {
        Self {
            platform: PLATFORM_NAME.to_string(),
            name: DEFAULT_PLATFORM_DISPLAY_NAME.to_string(),
            mac_address,
        }
    }

    /// Validate a single platform block.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the block is not an object of the
    /// expected shape, `Error::MissingField` if `macaddress` is absent, and
    /// `Error::InvalidMacAddress` if it is malformed.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let raw: RawPlatformConfig = serde_json::from_value(value.clone())
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let mac = raw
            .macaddress
            .ok_or_else(|| Error::MissingField("macaddress".to_string()))?;

        let name = raw
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_PLATFORM_DISPLAY_NAME.to_string());

        Ok(Self {
            platform: raw.platform.unwrap_or_else(|| PLATFORM_NAME.to_string()),
            name,
            mac_address: MacAddress::new(&mac)?,
        })
    }

    /// Find and validate the Trinnov block in a host config document.
    ///
    /// # Errors
    /// Returns `Error::PlatformNotFound` if no entry of `platforms` has
    /// `"platform": "TrinnovPlatform"`, otherwise the errors of [`from_value`].
    ///
    /// [`from_value`]: PlatformConfig::from_value
    pub fn from_host_config(document: &str) -> Result<Self> {
        let file: HostConfigFile = serde_json::from_str(document)?;

        let block = file
            .platforms
            .iter()
            .find(|p| p.get("platform").and_then(|v| v.as_str()) == Some(PLATFORM_NAME))
            .ok_or_else(|| Error::PlatformNotFound(PLATFORM_NAME.to_string()))?;

        Self::from_value(block)
    }

    /// Read a host config file from disk and extract the Trinnov block.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_host_config(&content)
    }
}
