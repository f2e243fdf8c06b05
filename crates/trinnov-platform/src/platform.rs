//! Platform controller.
//!
//! [`TrinnovPlatform`] owns the accessories of one configured processor. It
//! collects the accessories the host restores from its cache, and once the
//! host has finished launching it reconciles them with the device list:
//! known devices are refreshed, new ones registered and stale ones removed.

use crate::accessory::{AccessoryOptions, TrinnovAccessory};
use crate::error::{PlatformError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{error, info};
use trinnov_core::constants::{
    DEVICE_ID_DASHED_PREFIX, DEVICE_ID_PREFIX, PLACEHOLDER_DEVICES, PLATFORM_NAME, PLUGIN_NAME,
};
use trinnov_core::{DeviceDescriptor, PlatformConfig};
use trinnov_host::{AccessoryHandle, AccessoryUuid, Category, DynamicPlatform, Host};

/// Outcome of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Cached accessories that were refreshed.
    pub restored: Vec<AccessoryUuid>,

    /// Accessories registered for the first time.
    pub registered: Vec<AccessoryUuid>,

    /// Cached accessories that no longer match a device.
    pub removed: Vec<AccessoryUuid>,

    /// Accessories the host refused. Discovery carried on without them.
    pub failed: Vec<AccessoryUuid>,
}

impl DiscoveryReport {
    /// Check whether any accessory failed.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Dynamic platform exposing a Trinnov processor.
///
/// # Examples
///
/// ```
/// use trinnov_core::{MacAddress, PlatformConfig};
/// use trinnov_host::MockHost;
/// use trinnov_platform::TrinnovPlatform;
///
/// #[tokio::main]
/// async fn main() -> trinnov_platform::Result<()> {
///     let (host, handle) = MockHost::new();
///     let config = PlatformConfig::new(MacAddress::new("AA:BB")?);
///
///     let mut platform = TrinnovPlatform::new(host, config);
///     let report = platform.did_finish_launching().await?;
///
///     assert_eq!(report.registered.len(), 4);
///     assert_eq!(handle.registered_uuids().len(), 4);
///
///     platform.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct TrinnovPlatform<H: Host> {
    host: H,
    config: PlatformConfig,
    options: AccessoryOptions,

    /// Accessories restored from the host cache or registered by a previous
    /// pass, keyed by identity.
    known: HashMap<AccessoryUuid, AccessoryHandle>,

    /// Live adapters, keyed by identity.
    adapters: BTreeMap<AccessoryUuid, TrinnovAccessory>,

    launched: bool,
}

impl<H: Host> TrinnovPlatform<H> {
    /// Create a platform for a validated configuration.
    pub fn new(host: H, config: PlatformConfig) -> Self {
        info!("Finished initializing platform: {}", config.name);
        Self {
            host,
            config,
            options: AccessoryOptions::default(),
            known: HashMap::new(),
            adapters: BTreeMap::new(),
            launched: false,
        }
    }

    /// Replace the adapter options.
    pub fn with_options(mut self, options: AccessoryOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the platform configuration.
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Get the host the platform talks to.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Record an accessory restored from the host cache.
    pub fn configure_accessory(&mut self, accessory: AccessoryHandle) {
        info!("Loading accessory from cache: {}", accessory.display_name());
        self.known.insert(accessory.uuid(), accessory);
    }

    /// Run discovery once the host has restored every cached accessory.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::AlreadyLaunched` when called more than once.
    pub async fn did_finish_launching(&mut self) -> Result<DiscoveryReport> {
        if self.launched {
            return Err(PlatformError::AlreadyLaunched);
        }
        self.launched = true;
        info!("Executed didFinishLaunching callback");

        Ok(self.discover_devices().await)
    }

    /// The devices this platform exposes.
    ///
    /// The processor is not queried: two devices are derived from the
    /// configured MAC address and named after the platform, the rest are
    /// fixed placeholders.
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        let mac = self.config.mac_address.as_str();
        let name = self.config.name.as_str();

        [
            DeviceDescriptor::new(format!("{DEVICE_ID_PREFIX}{mac}"), name),
            DeviceDescriptor::new(format!("{DEVICE_ID_DASHED_PREFIX}{mac}"), name),
        ]
        .into_iter()
        .chain(
            PLACEHOLDER_DEVICES
                .iter()
                .map(|(unique_id, display_name)| DeviceDescriptor::new(*unique_id, *display_name)),
        )
        .collect()
    }

    /// Reconcile known accessories with the device list.
    ///
    /// A host failure for one accessory is logged and recorded in the report;
    /// the remaining accessories are still processed.
    pub async fn discover_devices(&mut self) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        let mut seen = HashSet::new();

        for device in self.devices() {
            let uuid = AccessoryUuid::generate(&device.unique_id);
            seen.insert(uuid);

            match self.known.get(&uuid).cloned() {
                Some(existing) => match self.restore_accessory(existing, &device).await {
                    Ok(()) => report.restored.push(uuid),
                    Err(e) => {
                        error!(accessory = %uuid, error = %e, "Failed to restore {}", device);
                        report.failed.push(uuid);
                    }
                },
                None => match self.add_accessory(uuid, &device).await {
                    Ok(()) => report.registered.push(uuid),
                    Err(e) => {
                        error!(accessory = %uuid, error = %e, "Failed to add {}", device);
                        report.failed.push(uuid);
                    }
                },
            }
        }

        let mut stale: Vec<_> = self
            .known
            .iter()
            .filter(|(uuid, _)| !seen.contains(*uuid))
            .map(|(_, handle)| handle.clone())
            .collect();
        stale.sort_by_key(AccessoryHandle::uuid);

        for accessory in stale {
            let uuid = accessory.uuid();
            match self.remove_accessory(accessory).await {
                Ok(()) => report.removed.push(uuid),
                Err(e) => {
                    error!(accessory = %uuid, error = %e, "Failed to remove stale accessory");
                    report.failed.push(uuid);
                }
            }
        }

        info!(
            "Discovery finished: {} restored, {} added, {} removed, {} failed",
            report.restored.len(),
            report.registered.len(),
            report.removed.len(),
            report.failed.len()
        );
        report
    }

    async fn restore_accessory(
        &mut self,
        accessory: AccessoryHandle,
        device: &DeviceDescriptor,
    ) -> Result<()> {
        info!("Restoring existing accessory from cache: {}", accessory.display_name());

        let uuid = accessory.uuid();
        accessory.with(|a| device.store_in(a.context_mut()))?;

        // A live adapter keeps its handlers and state across passes.
        let adapter = if self.adapters.contains_key(&uuid) {
            None
        } else {
            Some(TrinnovAccessory::new(accessory.clone(), &self.options)?)
        };
        self.host
            .update_platform_accessories(std::slice::from_ref(&accessory))
            .await?;

        if let Some(adapter) = adapter {
            self.adapters.insert(uuid, adapter);
        }
        Ok(())
    }

    async fn add_accessory(
        &mut self,
        uuid: AccessoryUuid,
        device: &DeviceDescriptor,
    ) -> Result<()> {
        info!("Adding new accessory: {}", device.display_name);

        let accessory = self
            .host
            .create_accessory(&device.display_name, uuid, Category::AudioReceiver);
        accessory.with(|a| device.store_in(a.context_mut()))?;
        let adapter = TrinnovAccessory::new(accessory.clone(), &self.options)?;
        self.host
            .register_platform_accessories(
                PLUGIN_NAME,
                PLATFORM_NAME,
                std::slice::from_ref(&accessory),
            )
            .await?;

        self.known.insert(uuid, accessory);
        self.adapters.insert(uuid, adapter);
        Ok(())
    }

    async fn remove_accessory(&mut self, accessory: AccessoryHandle) -> Result<()> {
        info!("Removing existing accessory from cache: {}", accessory.display_name());

        self.host
            .unregister_platform_accessories(
                PLUGIN_NAME,
                PLATFORM_NAME,
                std::slice::from_ref(&accessory),
            )
            .await?;

        self.known.remove(&accessory.uuid());
        if let Some(mut adapter) = self.adapters.remove(&accessory.uuid()) {
            adapter.stop().await;
        }
        Ok(())
    }

    /// Stop every adapter and wait for its motion demo to finish.
    pub async fn shutdown(&mut self) {
        info!("Stopping {} accessories", self.adapters.len());
        for adapter in self.adapters.values_mut() {
            adapter.stop().await;
        }
        self.adapters.clear();
    }

    /// Get the live adapter of an accessory.
    pub fn accessory(&self, uuid: AccessoryUuid) -> Option<&TrinnovAccessory> {
        self.adapters.get(&uuid)
    }

    /// Iterate over the live adapters, ordered by identity.
    pub fn accessories(&self) -> impl Iterator<Item = &TrinnovAccessory> {
        self.adapters.values()
    }

    /// Check whether the platform knows an accessory, live or cached.
    pub fn is_known(&self, uuid: AccessoryUuid) -> bool {
        self.known.contains_key(&uuid)
    }
}

impl<H: Host> DynamicPlatform for TrinnovPlatform<H> {
    type Error = PlatformError;

    fn plugin_name(&self) -> &str {
        PLUGIN_NAME
    }

    fn platform_name(&self) -> &str {
        PLATFORM_NAME
    }

    fn configure_accessory(&mut self, accessory: AccessoryHandle) {
        TrinnovPlatform::configure_accessory(self, accessory);
    }

    async fn did_finish_launching(&mut self) -> Result<()> {
        let report = TrinnovPlatform::did_finish_launching(self).await?;
        if report.has_failures() {
            error!("{} accessories could not be set up", report.failed.len());
        }
        Ok(())
    }

    async fn shutdown(&mut self) {
        TrinnovPlatform::shutdown(self).await;
    }
}

impl<H: Host> std::fmt::Debug for TrinnovPlatform<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrinnovPlatform")
            .field("config", &self.config)
            .field("known", &self.known.len())
            .field("adapters", &self.adapters.len())
            .field("launched", &self.launched)
            .finish_non_exhaustive()
    }
}
