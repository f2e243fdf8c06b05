//! Trinnov dynamic platform.
//!
//! This crate contains the two halves of the plugin:
//!
//! - [`TrinnovPlatform`], the controller that turns the configured processor
//!   into host accessories on every launch.
//! - [`TrinnovAccessory`], the adapter that wires one accessory's television,
//!   speaker and motion sensor services to an in-memory state bag.
//!
//! The platform is generic over the [`Host`](trinnov_host::Host) it runs in,
//! so the same code is driven by the bridge binary and by
//! [`MockHost`](trinnov_host::MockHost) in tests.

pub mod accessory;
pub mod demo;
pub mod error;
pub mod platform;
pub mod state;

pub use accessory::{AccessoryOptions, TrinnovAccessory};
pub use demo::MotionDemo;
pub use error::{PlatformError, Result};
pub use platform::{DiscoveryReport, TrinnovPlatform};
pub use state::{AccessoryState, HandlerResult, SharedState};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
