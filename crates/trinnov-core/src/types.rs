use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key under which the descriptor is stored in an accessory context.
const CONTEXT_DEVICE_KEY: &str = "device";

/// A device found by discovery.
///
/// The unique id feeds the host-side identity of the accessory; the display
/// name becomes its label. Descriptors are rebuilt on every discovery pass and
/// only outlive it inside the accessory context the host persists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    /// Stable identifier the accessory identity is derived from.
    pub unique_id: String,

    /// Human readable label.
    pub display_name: String,
}

impl DeviceDescriptor {
    pub fn new(unique_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Read the descriptor back out of an accessory context.
    ///
    /// # Errors
    /// Returns `Error::MissingDevice` if the context has no `device` entry and
    /// `Error::Json` if the entry does not have the descriptor shape.
    pub fn from_context(context: &serde_json::Value) -> Result<Self> {
        let device = context.get(CONTEXT_DEVICE_KEY).ok_or(Error::MissingDevice)?;
        Ok(serde_json::from_value(device.clone())?)
    }

    /// Store the descriptor into an accessory context, replacing any previous one.
    ///
    /// A context that is not a JSON object is replaced by a fresh object.
    pub fn store_in(&self, context: &mut serde_json::Value) -> Result<()> {
        let value = serde_json::to_value(self)?;
        match context {
            serde_json::Value::Object(map) => {
                map.insert(CONTEXT_DEVICE_KEY.to_string(), value);
            }
            other => {
                let mut map = serde_json::Map::new();
                map.insert(CONTEXT_DEVICE_KEY.to_string(), value);
                *other = serde_json::Value::Object(map);
            }
        }
        Ok(())
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.unique_id)
    }
}
