//! In-process bridge host.
//!
//! The `Bridge` keeps the registry of published accessories, persists it to
//! the accessory cache and drives a platform through its lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  HostEvent (mpsc)   ┌──────────────┐
//! │              │────────────────────►│              │
//! │    Bridge    │                     │   Platform   │
//! │  (registry)  │◄────────────────────│              │
//! └──────┬───────┘  register/update/   └──────────────┘
//!        │          unregister (Host)
//!        ▼
//!  cachedAccessories.json
//! ```
//!
//! Restored accessories are emitted before `DidFinishLaunching` on the same
//! channel, so a platform always sees its cache before discovery starts.
//!
//! # Examples
//!
//! ```no_run
//! use trinnov_host::{Bridge, BridgeConfig};
//!
//! #[tokio::main]
//! async fn main() -> trinnov_host::Result<()> {
//!     let (bridge, mut events) = Bridge::new(BridgeConfig::with_storage_dir("/var/lib/trinnov"));
//!
//!     bridge.start()?;
//!     while let Some(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     bridge.shutdown()?;
//!     Ok(())
//! }
//! ```

use crate::accessory::{AccessoryHandle, PlatformAccessory};
use crate::cache::AccessoryCache;
use crate::error::{HostError, Result};
use crate::traits::{DynamicPlatform, Host};
use crate::types::{AccessoryUuid, CharacteristicType, CharacteristicValue, ServiceType};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// File name of the accessory cache inside the storage directory.
pub const CACHE_FILE_NAME: &str = "cachedAccessories.json";

/// Lifecycle event delivered to a platform.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum HostEvent {
    /// An accessory was restored from the cache.
    ///
    /// Carries the plugin and platform that registered it, so a host serving
    /// several platforms hands each one only its own accessories.
    AccessoryRestored {
        plugin: String,
        platform: String,
        accessory: AccessoryHandle,
    },

    /// Every cached accessory has been restored.
    DidFinishLaunching,

    /// The host is stopping.
    Shutdown,
}

/// Receiving side of the bridge lifecycle events.
#[derive(Debug)]
pub struct HostEvents {
    rx: mpsc::UnboundedReceiver<HostEvent>,
}

impl HostEvents {
    /// Receive the next lifecycle event.
    ///
    /// Returns `None` once the bridge has been dropped.
    pub async fn recv(&mut self) -> Option<HostEvent> {
        self.rx.recv().await
    }
}

/// Bridge configuration.
///
/// Without a cache path the bridge keeps accessories in memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Path of the accessory cache file.
    pub cache_path: Option<PathBuf>,
}

impl BridgeConfig {
    /// Use an explicit cache file.
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: Some(cache_path.into()),
        }
    }

    /// Keep the cache in `<dir>/accessories/cachedAccessories.json`.
    ///
    /// # Examples
    ///
    /// ```
    /// use trinnov_host::BridgeConfig;
    /// use std::path::Path;
    ///
    /// let config = BridgeConfig::with_storage_dir("/tmp/bridge");
    /// assert_eq!(
    ///     config.cache_path.as_deref(),
    ///     Some(Path::new("/tmp/bridge/accessories/cachedAccessories.json"))
    /// );
    /// ```
    pub fn with_storage_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("accessories").join(CACHE_FILE_NAME))
    }
}

/// Registry entry for a published accessory.
#[derive(Debug, Clone)]
struct RegisteredAccessory {
    plugin: String,
    platform: String,
    handle: AccessoryHandle,
    registered_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner {
    config: BridgeConfig,
    registry: RwLock<HashMap<AccessoryUuid, RegisteredAccessory>>,
    launched: AtomicBool,
    stopped: AtomicBool,
    events: mpsc::UnboundedSender<HostEvent>,
}

/// In-process host that publishes accessories and caches them across runs.
///
/// Cloning is cheap; all clones share one registry.
#[derive(Debug, Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl Bridge {
    /// Create a bridge and the event stream its platform consumes.
    pub fn new(config: BridgeConfig) -> (Self, HostEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bridge = Self {
            inner: Arc::new(Inner {
                config,
                registry: RwLock::new(HashMap::new()),
                launched: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                events: tx,
            }),
        };
        (bridge, HostEvents { rx })
    }

    /// Get the bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Check whether `start` has been called.
    pub fn is_launched(&self) -> bool {
        self.inner.launched.load(Ordering::SeqCst)
    }

    /// Load the accessory cache and emit the launch events.
    ///
    /// Every cached accessory is put back into the registry and announced with
    /// `HostEvent::AccessoryRestored`, followed by one
    /// `HostEvent::DidFinishLaunching`. An unreadable cache is logged and
    /// treated as empty. Returns the number of restored accessories.
    ///
    /// # Errors
    ///
    /// Returns `HostError::AlreadyLaunched` if the bridge was already started.
    pub fn start(&self) -> Result<usize> {
        if self.inner.launched.swap(true, Ordering::SeqCst) {
            return Err(HostError::AlreadyLaunched);
        }

        let cached = match &self.inner.config.cache_path {
            Some(path) => match AccessoryCache::load(path) {
                Ok(Some(cache)) => cache.accessories,
                Ok(None) => {
                    debug!("No accessory cache at {}", path.display());
                    Vec::new()
                }
                Err(e) => {
                    warn!("Ignoring accessory cache: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut restored = Vec::with_capacity(cached.len());
        {
            let mut registry = self.write_registry();
            for entry in cached {
                let plugin = entry.plugin.clone();
                let platform = entry.platform.clone();
                let handle = AccessoryHandle::new(PlatformAccessory::from_cached(entry));
                registry.insert(
                    handle.uuid(),
                    RegisteredAccessory {
                        plugin: plugin.clone(),
                        platform: platform.clone(),
                        handle: handle.clone(),
                        registered_at: Utc::now(),
                    },
                );
                restored.push(HostEvent::AccessoryRestored {
                    plugin,
                    platform,
                    accessory: handle,
                });
            }
        }

        let count = restored.len();
        info!("Restoring {} cached accessories", count);
        for event in restored {
            self.emit(event);
        }
        self.emit(HostEvent::DidFinishLaunching);

        Ok(count)
    }

    /// Save the cache and tell the platform to stop.
    ///
    /// Only the first call has any effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be written. The `Shutdown` event
    /// is sent regardless.
    pub fn shutdown(&self) -> Result<()> {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!("Shutting down bridge");
        let saved = self.save_cache();
        self.emit(HostEvent::Shutdown);
        saved
    }

    /// Get every registered accessory, ordered by identity.
    pub fn accessories(&self) -> Vec<AccessoryHandle> {
        let registry = self.read_registry();
        let mut handles: Vec<_> = registry.values().map(|r| r.handle.clone()).collect();
        handles.sort_by_key(AccessoryHandle::uuid);
        handles
    }

    /// Get a registered accessory.
    pub fn accessory(&self, uuid: AccessoryUuid) -> Option<AccessoryHandle> {
        self.read_registry().get(&uuid).map(|r| r.handle.clone())
    }

    /// Get when an accessory was registered or restored.
    pub fn registered_at(&self, uuid: AccessoryUuid) -> Option<DateTime<Utc>> {
        self.read_registry().get(&uuid).map(|r| r.registered_at)
    }

    /// Serve a controller read on a registered accessory.
    ///
    /// # Errors
    ///
    /// Returns `HostError::UnknownAccessory` if the accessory is not
    /// registered, otherwise whatever the accessory returns.
    pub fn handle_get(
        &self,
        uuid: AccessoryUuid,
        service: ServiceType,
        subtype: Option<&str>,
        characteristic: CharacteristicType,
    ) -> Result<CharacteristicValue> {
        let handle = self
            .accessory(uuid)
            .ok_or_else(|| HostError::unknown_accessory(uuid))?;
        handle.with(|a| a.handle_get(service, subtype, characteristic))
    }

    /// Serve a controller write on a registered accessory.
    ///
    /// # Errors
    ///
    /// Returns `HostError::UnknownAccessory` if the accessory is not
    /// registered, otherwise whatever the accessory returns.
    pub fn handle_set(
        &self,
        uuid: AccessoryUuid,
        service: ServiceType,
        subtype: Option<&str>,
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    ) -> Result<()> {
        let handle = self
            .accessory(uuid)
            .ok_or_else(|| HostError::unknown_accessory(uuid))?;
        handle.with(|a| a.handle_set(service, subtype, characteristic, value))
    }

    /// Write every registered accessory to the cache file.
    ///
    /// Does nothing when the bridge has no cache path.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be written.
    pub fn save_cache(&self) -> Result<()> {
        let Some(path) = &self.inner.config.cache_path else {
            return Ok(());
        };

        let entries: Vec<_> = {
            let registry = self.read_registry();
            registry
                .values()
                .map(|r| r.handle.with(|a| a.to_cached(&r.plugin, &r.platform)))
                .collect()
        };

        let cache = AccessoryCache::new(entries);
        cache.save(path)?;
        debug!("Saved {} accessories to {}", cache.len(), path.display());
        Ok(())
    }

    fn emit(&self, event: HostEvent) {
        if self.inner.events.send(event).is_err() {
            debug!("Host event dropped, no platform is listening");
        }
    }

    fn persist(&self) {
        if let Err(e) = self.save_cache() {
            warn!("Failed to save accessory cache: {}", e);
        }
    }

    fn read_registry(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<AccessoryUuid, RegisteredAccessory>> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<AccessoryUuid, RegisteredAccessory>> {
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_known(
        registry: &HashMap<AccessoryUuid, RegisteredAccessory>,
        accessories: &[AccessoryHandle],
    ) -> Result<()> {
        match accessories.iter().find(|h| !registry.contains_key(&h.uuid())) {
            Some(missing) => Err(HostError::unknown_accessory(missing.uuid())),
            None => Ok(()),
        }
    }
}

impl Host for Bridge {
    async fn register_platform_accessories(
        &self,
        plugin: &str,
        platform: &str,
        accessories: &[AccessoryHandle],
    ) -> Result<()> {
        {
            let mut registry = self.write_registry();

            let mut batch = HashSet::new();
            for handle in accessories {
                let uuid = handle.uuid();
                if registry.contains_key(&uuid) {
                    return Err(HostError::registration_failed(uuid, "already registered"));
                }
                if !batch.insert(uuid) {
                    return Err(HostError::registration_failed(
                        uuid,
                        "listed twice in one registration",
                    ));
                }
            }

            for handle in accessories {
                info!(
                    "Registering accessory {} ({}) for {}",
                    handle.display_name(),
                    handle.uuid(),
                    platform
                );
                registry.insert(
                    handle.uuid(),
                    RegisteredAccessory {
                        plugin: plugin.to_string(),
                        platform: platform.to_string(),
                        handle: handle.clone(),
                        registered_at: Utc::now(),
                    },
                );
            }
        }

        self.persist();
        Ok(())
    }

    async fn update_platform_accessories(&self, accessories: &[AccessoryHandle]) -> Result<()> {
        {
            let mut registry = self.write_registry();
            Self::ensure_known(&registry, accessories)?;

            for handle in accessories {
                debug!("Updating accessory {}", handle.uuid());
                if let Some(entry) = registry.get_mut(&handle.uuid()) {
                    entry.handle = handle.clone();
                }
            }
        }

        self.persist();
        Ok(())
    }

    async fn unregister_platform_accessories(
        &self,
        _plugin: &str,
        platform: &str,
        accessories: &[AccessoryHandle],
    ) -> Result<()> {
        {
            let mut registry = self.write_registry();
            Self::ensure_known(&registry, accessories)?;

            for handle in accessories {
                info!("Removing accessory {} from {}", handle.uuid(), platform);
                registry.remove(&handle.uuid());
            }
        }

        self.persist();
        Ok(())
    }
}

/// Drive a platform from the host event stream.
///
/// Restored accessories owned by the platform go to `configure_accessory`;
/// accessories registered by any other plugin or platform are left alone. The
/// launch event goes to `did_finish_launching`. Returns after `Shutdown`, or
/// when the stream closes, once the platform's `shutdown` hook has run.
///
/// # Errors
///
/// Returns the platform's error if launching fails. The platform is shut down
/// first.
pub async fn run_platform<P: DynamicPlatform>(
    platform: &mut P,
    mut events: HostEvents,
) -> std::result::Result<(), P::Error> {
    while let Some(event) = events.recv().await {
        match event {
            HostEvent::AccessoryRestored {
                plugin: owner_plugin,
                platform: owner_platform,
                accessory,
            } => {
                if owner_plugin == platform.plugin_name()
                    && owner_platform == platform.platform_name()
                {
                    platform.configure_accessory(accessory);
                } else {
                    debug!(
                        "Skipping cached accessory {} owned by {} ({})",
                        accessory.uuid(),
                        owner_platform,
                        owner_plugin
                    );
                }
            }
            HostEvent::DidFinishLaunching => {
                if let Err(e) = platform.did_finish_launching().await {
                    warn!("Platform failed to launch: {}", e);
                    platform.shutdown().await;
                    return Err(e);
                }
            }
            HostEvent::Shutdown => break,
        }
    }

    platform.shutdown().await;
    Ok(())
}
