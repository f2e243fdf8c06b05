//! Host contract for the Trinnov bridge.
//!
//! This crate models the accessory host a dynamic platform plugs into:
//! accessories made of services and characteristics, the calls a platform
//! makes to publish them, and the lifecycle events the host sends back.
//!
//! # Accessory Model
//!
//! A [`PlatformAccessory`] holds [`Service`]s, each holding
//! [`Characteristic`]s. Platforms attach read and write handlers to
//! characteristics and push unsolicited changes with
//! [`Service::update_characteristic`]:
//!
//! ```
//! use trinnov_host::{
//!     AccessoryUuid, Category, CharacteristicType, CharacteristicValue, PlatformAccessory,
//!     ServiceType,
//! };
//!
//! let mut accessory = PlatformAccessory::new(
//!     "Living Room",
//!     AccessoryUuid::generate("trinnovAA:BB"),
//!     Category::AudioReceiver,
//! );
//!
//! accessory
//!     .get_or_add_service(ServiceType::TelevisionSpeaker, "Living Room", None)
//!     .get_characteristic(CharacteristicType::Volume)
//!     .on_get(|| Ok(CharacteristicValue::Int(100)));
//!
//! let volume = accessory
//!     .handle_get(ServiceType::TelevisionSpeaker, None, CharacteristicType::Volume)
//!     .unwrap();
//! assert_eq!(volume, CharacteristicValue::Int(100));
//! ```
//!
//! # Lifecycle
//!
//! The [`Bridge`] restores cached accessories, announces them to the platform
//! through [`HostEvent::AccessoryRestored`], then sends
//! [`HostEvent::DidFinishLaunching`]. [`run_platform`] feeds these events to a
//! [`DynamicPlatform`] until the bridge shuts down.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] which uses the
//! [`HostError`] error type.
//!
//! # Mock Implementations
//!
//! [`MockHost`] records every call a platform makes, for testing platforms
//! without a bridge.

pub mod accessory;
pub mod bridge;
pub mod cache;
pub mod characteristic;
pub mod error;
pub mod mock;
pub mod service;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use accessory::{AccessoryHandle, PlatformAccessory};
pub use bridge::{Bridge, BridgeConfig, CACHE_FILE_NAME, HostEvent, HostEvents, run_platform};
pub use cache::AccessoryCache;
pub use characteristic::{Characteristic, GetHandler, SetHandler};
pub use error::{HostError, Result};
pub use mock::{HostCall, MockHost, MockHostHandle};
pub use service::Service;
pub use traits::{DynamicPlatform, Host};
pub use types::{
    AccessoryUuid, Category, CharacteristicEvent, CharacteristicType, CharacteristicValue,
    SLEEP_DISCOVERY_ALWAYS_DISCOVERABLE, ServiceType, VOLUME_CONTROL_ABSOLUTE,
};
