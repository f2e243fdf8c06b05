//! Persistent accessory cache.
//!
//! The bridge writes every registered accessory to a JSON file on shutdown and
//! reads it back on start, so platforms can restore accessories instead of
//! registering them again. Handlers are not persisted.

use crate::error::{HostError, Result};
use crate::types::{AccessoryUuid, Category, CharacteristicType, CharacteristicValue, ServiceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of the accessory cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryCache {
    /// When the cache was written.
    pub saved_at: DateTime<Utc>,

    /// Cached accessories, ordered by identity.
    pub accessories: Vec<CachedAccessory>,
}

/// Snapshot of one accessory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAccessory {
    /// Plugin that registered the accessory.
    pub plugin: String,

    /// Platform that registered the accessory.
    pub platform: String,

    pub uuid: AccessoryUuid,
    pub display_name: String,
    pub category: Category,

    /// Platform-owned context.
    #[serde(default)]
    pub context: serde_json::Value,

    #[serde(default)]
    pub services: Vec<CachedService>,
}

/// Snapshot of one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedService {
    #[serde(rename = "type")]
    pub kind: ServiceType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub characteristics: Vec<CachedCharacteristic>,
}

/// Snapshot of one characteristic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedCharacteristic {
    #[serde(rename = "type")]
    pub kind: CharacteristicType,
    pub value: CharacteristicValue,
}

impl AccessoryCache {
    /// Build a cache stamped with the current time.
    pub fn new(mut accessories: Vec<CachedAccessory>) -> Self {
        accessories.sort_by_key(|a| a.uuid);
        Self {
            saved_at: Utc::now(),
            accessories,
        }
    }

    /// Read the cache file.
    ///
    /// Returns `Ok(None)` when the file does not exist, which is the case on the
    /// first run.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Io` if the file cannot be read and
    /// `HostError::Cache` if it is not a valid cache.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| HostError::cache(format!("{}: {}", path.display(), e)))
    }

    /// Write the cache file.
    ///
    /// The file is written next to its destination and renamed into place, so
    /// an interrupted write leaves the previous cache intact.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Io` if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Number of cached accessories.
    pub fn len(&self) -> usize {
        self.accessories.len()
    }

    /// Check whether the cache holds no accessories.
    pub fn is_empty(&self) -> bool {
        self.accessories.is_empty()
    }
}
