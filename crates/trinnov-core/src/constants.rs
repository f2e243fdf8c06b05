//! Fixed identifiers and defaults shared by the host and the platform.

use std::time::Duration;

// ============================================================================
// Plugin registration
// ============================================================================

/// Name the plugin registers under with the host.
pub const PLUGIN_NAME: &str = "homebridge-trinnov";

/// Value of the `platform` key that selects this platform in the host config.
pub const PLATFORM_NAME: &str = "TrinnovPlatform";

/// Platform name used when the config block has no `name`.
pub const DEFAULT_PLATFORM_DISPLAY_NAME: &str = "Trinnov";

// ============================================================================
// Accessory information
// ============================================================================

/// Manufacturer reported in the accessory information service.
pub const MANUFACTURER: &str = "Trinnov";

/// Model reported in the accessory information service.
///
/// The processor is not queried, so this is a fixed value for now.
pub const MODEL: &str = "Altitude";

/// Serial number reported in the accessory information service.
pub const DEFAULT_SERIAL_NUMBER: &str = "Default-Serial";

// ============================================================================
// Placeholder devices
// ============================================================================

/// Prefix of the first MAC-derived device id (`trinnov<mac>`).
pub const DEVICE_ID_PREFIX: &str = "trinnov";

/// Prefix of the second MAC-derived device id (`trinnov-<mac>`).
pub const DEVICE_ID_DASHED_PREFIX: &str = "trinnov-";

/// Literal placeholder devices as `(unique id, display name)`.
pub const PLACEHOLDER_DEVICES: [(&str, &str); 2] = [("ABCD", "Bedroom"), ("EFGH", "Kitchen")];

// ============================================================================
// Accessory state defaults
// ============================================================================

pub const DEFAULT_POWER: bool = true;
pub const DEFAULT_VOLUME: i64 = 100;
pub const DEFAULT_MUTE: bool = false;
pub const DEFAULT_INPUT: &str = "HDMI 1";
pub const DEFAULT_ON: bool = true;
pub const DEFAULT_BRIGHTNESS: i64 = 100;

// ============================================================================
// Demo motion sensors
// ============================================================================

/// Period of the demo motion toggle.
pub const MOTION_TOGGLE_INTERVAL: Duration = Duration::from_secs(10);

pub const MOTION_SENSOR_ONE_NAME: &str = "Motion Sensor One Name";
pub const MOTION_SENSOR_ONE_SUBTYPE: &str = "YourUniqueIdentifier-1";
pub const MOTION_SENSOR_TWO_NAME: &str = "Motion Sensor Two Name";
pub const MOTION_SENSOR_TWO_SUBTYPE: &str = "YourUniqueIdentifier-2";

// ============================================================================
// MAC address validation
// ============================================================================

/// Minimum number of two-digit hex groups in a configured MAC address.
pub const MIN_MAC_GROUPS: usize = 1;

/// Maximum number of two-digit hex groups (EUI-64).
pub const MAX_MAC_GROUPS: usize = 8;
