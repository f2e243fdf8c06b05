//! Platform accessories.
//!
//! A [`PlatformAccessory`] is the host-managed object a platform decorates with
//! services. The host persists it between runs; the platform only keeps an
//! [`AccessoryHandle`] to it.
//!
//! # Examples
//!
//! ```
//! use trinnov_host::{AccessoryUuid, Category, PlatformAccessory, ServiceType};
//!
//! let uuid = AccessoryUuid::generate("ABCD");
//! let mut accessory = PlatformAccessory::new("Bedroom", uuid, Category::AudioReceiver);
//!
//! accessory.get_or_add_service(ServiceType::Television, "Bedroom", None);
//! assert!(accessory.get_service(ServiceType::Television).is_some());
//! assert!(accessory.get_service(ServiceType::AccessoryInformation).is_some());
//! ```

use crate::cache::{CachedAccessory, CachedCharacteristic, CachedService};
use crate::error::{HostError, Result};
use crate::service::{Notifier, Service};
use crate::types::{
    AccessoryUuid, Category, CharacteristicEvent, CharacteristicType, CharacteristicValue,
    ServiceType,
};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// Capacity of the per-accessory characteristic event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Host-managed accessory with its services and persisted context.
#[derive(Debug)]
pub struct PlatformAccessory {
    uuid: AccessoryUuid,
    display_name: String,
    category: Category,
    context: serde_json::Value,
    services: Vec<Service>,
    events: broadcast::Sender<CharacteristicEvent>,
}

impl PlatformAccessory {
    /// Create an accessory with an empty context.
    ///
    /// The accessory information service is added immediately, as every
    /// accessory must carry one.
    pub fn new(display_name: impl Into<String>, uuid: AccessoryUuid, category: Category) -> Self {
        let display_name = display_name.into();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let mut accessory = Self {
            uuid,
            display_name: display_name.clone(),
            category,
            context: serde_json::Value::Object(serde_json::Map::new()),
            services: Vec::new(),
            events,
        };
        accessory.get_or_add_service(ServiceType::AccessoryInformation, display_name, None);
        accessory
    }

    /// Get the accessory identity.
    pub fn uuid(&self) -> AccessoryUuid {
        self.uuid
    }

    /// Get the accessory label.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Get the accessory category.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Get the platform-owned context persisted with the accessory.
    pub fn context(&self) -> &serde_json::Value {
        &self.context
    }

    /// Get the platform-owned context mutably.
    pub fn context_mut(&mut self) -> &mut serde_json::Value {
        &mut self.context
    }

    /// Iterate over the services in creation order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    /// Subscribe to values pushed with `update_characteristic`.
    pub fn subscribe(&self) -> broadcast::Receiver<CharacteristicEvent> {
        self.events.subscribe()
    }

    /// Get the first service of a type.
    pub fn get_service(&mut self, kind: ServiceType) -> Option<&mut Service> {
        self.services.iter_mut().find(|s| s.kind() == kind)
    }

    /// Get a service by its name or subtype.
    pub fn get_service_by_name(&mut self, name: &str) -> Option<&mut Service> {
        self.services
            .iter_mut()
            .find(|s| s.name() == name || s.subtype() == Some(name))
    }

    /// Get the service identified by type and subtype.
    pub fn get_service_with_subtype(
        &mut self,
        kind: ServiceType,
        subtype: Option<&str>,
    ) -> Option<&mut Service> {
        self.services.iter_mut().find(|s| s.matches(kind, subtype))
    }

    /// Add a service.
    ///
    /// # Errors
    ///
    /// Returns `HostError::DuplicateService` if a service with the same type and
    /// subtype already exists. Services of one type need distinct subtypes.
    pub fn add_service(
        &mut self,
        kind: ServiceType,
        name: impl Into<String>,
        subtype: Option<&str>,
    ) -> Result<&mut Service> {
        if self.services.iter().any(|s| s.matches(kind, subtype)) {
            return Err(HostError::DuplicateService {
                service: kind,
                subtype: subtype.map(str::to_string),
            });
        }
        Ok(self.push_service(kind, name, subtype))
    }

    /// Get the service identified by type and subtype, adding it if absent.
    pub fn get_or_add_service(
        &mut self,
        kind: ServiceType,
        name: impl Into<String>,
        subtype: Option<&str>,
    ) -> &mut Service {
        match self.services.iter().position(|s| s.matches(kind, subtype)) {
            Some(index) => &mut self.services[index],
            None => self.push_service(kind, name, subtype),
        }
    }

    /// Remove the service identified by type and subtype.
    pub fn remove_service(&mut self, kind: ServiceType, subtype: Option<&str>) -> Option<Service> {
        let index = self.services.iter().position(|s| s.matches(kind, subtype))?;
        Some(self.services.remove(index))
    }

    /// Serve a read request from a controller.
    ///
    /// # Errors
    ///
    /// Returns `ServiceNotFound` or `CharacteristicNotFound` when the target
    /// does not exist, or the read handler's error.
    pub fn handle_get(
        &mut self,
        service: ServiceType,
        subtype: Option<&str>,
        characteristic: CharacteristicType,
    ) -> Result<CharacteristicValue> {
        self.get_service_with_subtype(service, subtype)
            .ok_or(HostError::ServiceNotFound { service })?
            .characteristic_mut(characteristic)
            .ok_or(HostError::CharacteristicNotFound { characteristic })?
            .handle_get()
    }

    /// Serve a write request from a controller.
    ///
    /// # Errors
    ///
    /// Returns `ServiceNotFound` or `CharacteristicNotFound` when the target
    /// does not exist, or the write handler's error.
    pub fn handle_set(
        &mut self,
        service: ServiceType,
        subtype: Option<&str>,
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    ) -> Result<()> {
        self.get_service_with_subtype(service, subtype)
            .ok_or(HostError::ServiceNotFound { service })?
            .characteristic_mut(characteristic)
            .ok_or(HostError::CharacteristicNotFound { characteristic })?
            .handle_set(value)
    }

    /// Snapshot the accessory for the cache file.
    pub(crate) fn to_cached(&self, plugin: &str, platform: &str) -> CachedAccessory {
        CachedAccessory {
            plugin: plugin.to_string(),
            platform: platform.to_string(),
            uuid: self.uuid,
            display_name: self.display_name.clone(),
            category: self.category,
            context: self.context.clone(),
            services: self
                .services
                .iter()
                .map(|service| CachedService {
                    kind: service.kind(),
                    name: service.name().to_string(),
                    subtype: service.subtype().map(str::to_string),
                    characteristics: service
                        .characteristics()
                        .map(|c| CachedCharacteristic {
                            kind: c.kind(),
                            value: c.value().clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Rebuild an accessory from the cache file. Handlers are not persisted;
    /// the platform attaches them again when it adopts the accessory.
    pub(crate) fn from_cached(cached: CachedAccessory) -> Self {
        let mut accessory = Self::new(cached.display_name, cached.uuid, cached.category);
        accessory.context = cached.context;

        for service in cached.services {
            let restored = accessory.get_or_add_service(
                service.kind,
                service.name,
                service.subtype.as_deref(),
            );
            for characteristic in service.characteristics {
                restored.set_characteristic(characteristic.kind, characteristic.value);
            }
        }
        accessory
    }

    fn push_service(
        &mut self,
        kind: ServiceType,
        name: impl Into<String>,
        subtype: Option<&str>,
    ) -> &mut Service {
        let notifier = Notifier::new(self.uuid, self.events.clone());
        self.services.push(Service::new(
            kind,
            name,
            subtype.map(str::to_string),
            notifier,
        ));
        let last = self.services.len() - 1;
        &mut self.services[last]
    }
}

/// Shared handle to a platform accessory.
///
/// The host and the platform both hold the accessory: the host to dispatch
/// controller requests and persist it, the platform to wire handlers and push
/// updates. The identity is cached outside the lock.
///
/// # Examples
///
/// ```
/// use trinnov_host::{AccessoryHandle, AccessoryUuid, Category, PlatformAccessory};
///
/// let uuid = AccessoryUuid::generate("ABCD");
/// let accessory = PlatformAccessory::new("Bedroom", uuid, Category::AudioReceiver);
/// let handle = AccessoryHandle::new(accessory);
///
/// let name = handle.with(|accessory| accessory.display_name().to_string());
/// assert_eq!(name, "Bedroom");
/// assert_eq!(handle.uuid(), uuid);
/// ```
#[derive(Clone)]
pub struct AccessoryHandle {
    uuid: AccessoryUuid,
    inner: Arc<Mutex<PlatformAccessory>>,
}

impl AccessoryHandle {
    /// Wrap an accessory for sharing.
    pub fn new(accessory: PlatformAccessory) -> Self {
        Self {
            uuid: accessory.uuid(),
            inner: Arc::new(Mutex::new(accessory)),
        }
    }

    /// Get the accessory identity.
    pub fn uuid(&self) -> AccessoryUuid {
        self.uuid
    }

    /// Get a copy of the accessory label.
    pub fn display_name(&self) -> String {
        self.with(|accessory| accessory.display_name().to_string())
    }

    /// Subscribe to values pushed with `update_characteristic`.
    pub fn subscribe(&self) -> broadcast::Receiver<CharacteristicEvent> {
        self.with(|accessory| accessory.subscribe())
    }

    /// Run a closure with exclusive access to the accessory.
    ///
    /// The lock is held for the duration of the closure, so it must not block
    /// or await.
    pub fn with<R>(&self, f: impl FnOnce(&mut PlatformAccessory) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Check whether two handles point at the same accessory.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for AccessoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessoryHandle")
            .field("uuid", &self.uuid)
            .finish_non_exhaustive()
    }
}
