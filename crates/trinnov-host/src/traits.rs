//! Host and platform trait definitions.
//!
//! [`Host`] is what a platform calls into: creating accessories and asking the
//! host to publish, refresh or forget them. [`DynamicPlatform`] is what the host
//! calls into as it goes through its lifecycle.
//!
//! Both traits use native `async fn` methods, so they are used through generics
//! rather than trait objects.

#![allow(async_fn_in_trait)]

use crate::accessory::{AccessoryHandle, PlatformAccessory};
use crate::error::Result;
use crate::types::{AccessoryUuid, Category};
use std::fmt;

/// Services a host offers to a dynamic platform.
///
/// # Examples
///
/// ```
/// use trinnov_host::{AccessoryUuid, Category, Host, MockHost};
///
/// # async fn example() -> trinnov_host::Result<()> {
/// let (host, handle) = MockHost::new();
///
/// let uuid = AccessoryUuid::generate("ABCD");
/// let accessory = host.create_accessory("Bedroom", uuid, Category::AudioReceiver);
/// host.register_platform_accessories("homebridge-trinnov", "TrinnovPlatform", &[accessory])
///     .await?;
///
/// assert!(handle.registered(uuid));
/// # Ok(())
/// # }
/// ```
pub trait Host: Send + Sync {
    /// Create an accessory that is not yet known to the host.
    fn create_accessory(
        &self,
        display_name: &str,
        uuid: AccessoryUuid,
        category: Category,
    ) -> AccessoryHandle {
        AccessoryHandle::new(PlatformAccessory::new(display_name, uuid, category))
    }

    /// Publish new accessories to controllers.
    ///
    /// # Errors
    ///
    /// Returns `HostError::RegistrationFailed` if an accessory cannot be
    /// registered. Nothing is registered in that case.
    async fn register_platform_accessories(
        &self,
        plugin: &str,
        platform: &str,
        accessories: &[AccessoryHandle],
    ) -> Result<()>;

    /// Tell the host that registered accessories changed.
    ///
    /// # Errors
    ///
    /// Returns `HostError::UnknownAccessory` if an accessory is not registered.
    async fn update_platform_accessories(&self, accessories: &[AccessoryHandle]) -> Result<()>;

    /// Remove accessories from the host and its cache.
    ///
    /// # Errors
    ///
    /// Returns `HostError::UnknownAccessory` if an accessory is not registered.
    async fn unregister_platform_accessories(
        &self,
        plugin: &str,
        platform: &str,
        accessories: &[AccessoryHandle],
    ) -> Result<()>;
}

/// A platform that discovers and manages its own accessories.
///
/// The host first hands back every cached accessory the platform registered
/// through [`configure_accessory`](Self::configure_accessory), then calls
/// [`did_finish_launching`](Self::did_finish_launching) once, and finally
/// [`shutdown`](Self::shutdown) when it stops.
pub trait DynamicPlatform {
    /// Error reported by the launch hook.
    type Error: fmt::Display;

    /// Name of the plugin that provides this platform.
    fn plugin_name(&self) -> &str;

    /// Name the platform registers its accessories under.
    fn platform_name(&self) -> &str;

    /// Receive an accessory restored from the host cache.
    fn configure_accessory(&mut self, accessory: AccessoryHandle);

    /// Run discovery once all cached accessories have been restored.
    async fn did_finish_launching(&mut self) -> std::result::Result<(), Self::Error>;

    /// Release resources before the host stops.
    async fn shutdown(&mut self) {}
}
