//! Characteristics and their read/write handlers.
//!
//! A characteristic caches its last value. Platforms attach an `on_get` handler
//! to answer reads from their own state and an `on_set` handler to apply
//! writes; without handlers the cached value is served and overwritten.

use crate::Result;
use crate::types::{CharacteristicType, CharacteristicValue};
use std::fmt;
use std::sync::Arc;

/// Handler answering a read request.
pub type GetHandler = Arc<dyn Fn() -> Result<CharacteristicValue> + Send + Sync>;

/// Handler applying a write request.
pub type SetHandler = Arc<dyn Fn(CharacteristicValue) -> Result<()> + Send + Sync>;

/// A single typed attribute of a service.
///
/// # Examples
///
/// ```
/// use trinnov_host::{Characteristic, CharacteristicType, CharacteristicValue};
/// use std::sync::{Arc, Mutex};
///
/// let volume = Arc::new(Mutex::new(10));
///
/// let mut characteristic = Characteristic::new(CharacteristicType::Volume);
/// let read = Arc::clone(&volume);
/// let write = Arc::clone(&volume);
/// characteristic
///     .on_get(move || Ok(CharacteristicValue::Int(*read.lock().unwrap())))
///     .on_set(move |value| {
///         *write.lock().unwrap() = value.as_i64().unwrap_or_default();
///         Ok(())
///     });
///
/// characteristic.handle_set(CharacteristicValue::Int(42)).unwrap();
/// assert_eq!(characteristic.handle_get().unwrap(), CharacteristicValue::Int(42));
/// ```
#[derive(Clone)]
pub struct Characteristic {
    /// Characteristic type.
    kind: CharacteristicType,

    /// Last known value.
    value: CharacteristicValue,

    /// Read handler.
    on_get: Option<GetHandler>,

    /// Write handler.
    on_set: Option<SetHandler>,
}

impl Characteristic {
    /// Create a characteristic holding its type's default value.
    pub fn new(kind: CharacteristicType) -> Self {
        Self::with_value(kind, kind.default_value())
    }

    /// Create a characteristic holding a specific value.
    pub fn with_value(kind: CharacteristicType, value: CharacteristicValue) -> Self {
        Self {
            kind,
            value,
            on_get: None,
            on_set: None,
        }
    }

    /// Get the characteristic type.
    pub fn kind(&self) -> CharacteristicType {
        self.kind
    }

    /// Get the cached value without running the read handler.
    pub fn value(&self) -> &CharacteristicValue {
        &self.value
    }

    /// Replace the cached value without running the write handler.
    pub fn set_value(&mut self, value: impl Into<CharacteristicValue>) -> &mut Self {
        self.value = value.into();
        self
    }

    /// Attach the read handler, replacing any previous one.
    pub fn on_get<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn() -> Result<CharacteristicValue> + Send + Sync + 'static,
    {
        self.on_get = Some(Arc::new(handler));
        self
    }

    /// Attach the write handler, replacing any previous one.
    pub fn on_set<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(CharacteristicValue) -> Result<()> + Send + Sync + 'static,
    {
        self.on_set = Some(Arc::new(handler));
        self
    }

    /// Check whether a read handler is attached.
    pub fn has_get_handler(&self) -> bool {
        self.on_get.is_some()
    }

    /// Check whether a write handler is attached.
    pub fn has_set_handler(&self) -> bool {
        self.on_set.is_some()
    }

    /// Serve a read request.
    ///
    /// Runs the read handler when one is attached and caches its answer,
    /// otherwise returns the cached value.
    pub fn handle_get(&mut self) -> Result<CharacteristicValue> {
        if let Some(handler) = &self.on_get {
            self.value = handler()?;
        }
        Ok(self.value.clone())
    }

    /// Serve a write request.
    ///
    /// Runs the write handler when one is attached; the cached value only
    /// changes if the handler accepts the value.
    pub fn handle_set(&mut self, value: CharacteristicValue) -> Result<()> {
        if let Some(handler) = &self.on_set {
            handler(value.clone())?;
        }
        self.value = value;
        Ok(())
    }
}

impl fmt::Debug for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Characteristic")
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("on_get", &self.on_get.is_some())
            .field("on_set", &self.on_set.is_some())
            .finish()
    }
}
