//! Mock host that records platform calls.

use crate::accessory::AccessoryHandle;
use crate::error::{HostError, Result};
use crate::traits::Host;
use crate::types::AccessoryUuid;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A call received by the mock host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    /// `register_platform_accessories`.
    Register {
        plugin: String,
        platform: String,
        uuids: Vec<AccessoryUuid>,
    },

    /// `update_platform_accessories`.
    Update { uuids: Vec<AccessoryUuid> },

    /// `unregister_platform_accessories`.
    Unregister {
        plugin: String,
        platform: String,
        uuids: Vec<AccessoryUuid>,
    },
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<HostCall>,
    registered: BTreeMap<AccessoryUuid, AccessoryHandle>,
    refused: HashSet<AccessoryUuid>,
    unknown: HashSet<AccessoryUuid>,
}

/// Mock host for testing platforms.
///
/// Registrations always succeed unless the identity was marked with
/// [`MockHostHandle::fail_registration`]. Updates succeed unless the identity
/// was marked with [`MockHostHandle::fail_update`]. Removals are recorded
/// without checks.
///
/// # Examples
///
/// ```
/// use trinnov_host::{AccessoryUuid, Category, Host, HostCall, MockHost};
///
/// #[tokio::main]
/// async fn main() -> trinnov_host::Result<()> {
///     let (host, handle) = MockHost::new();
///     let uuid = AccessoryUuid::generate("ABCD");
///     let accessory = host.create_accessory("Bedroom", uuid, Category::AudioReceiver);
///
///     host.update_platform_accessories(&[accessory]).await?;
///
///     assert_eq!(handle.calls(), vec![HostCall::Update { uuids: vec![uuid] }]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockHost {
    state: Arc<Mutex<MockState>>,
}

impl MockHost {
    /// Create a mock host and the handle used to inspect it.
    pub fn new() -> (Self, MockHostHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockHostHandle { state },
        )
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new().0
    }
}

fn uuids(accessories: &[AccessoryHandle]) -> Vec<AccessoryUuid> {
    accessories.iter().map(AccessoryHandle::uuid).collect()
}

impl Host for MockHost {
    async fn register_platform_accessories(
        &self,
        plugin: &str,
        platform: &str,
        accessories: &[AccessoryHandle],
    ) -> Result<()> {
        let mut state = self.state();
        state.calls.push(HostCall::Register {
            plugin: plugin.to_string(),
            platform: platform.to_string(),
            uuids: uuids(accessories),
        });

        if let Some(refused) = accessories.iter().find(|h| state.refused.contains(&h.uuid())) {
            return Err(HostError::registration_failed(
                refused.uuid(),
                "refused by mock host",
            ));
        }

        for handle in accessories {
            state.registered.insert(handle.uuid(), handle.clone());
        }
        Ok(())
    }

    async fn update_platform_accessories(&self, accessories: &[AccessoryHandle]) -> Result<()> {
        let mut state = self.state();
        state.calls.push(HostCall::Update {
            uuids: uuids(accessories),
        });

        match accessories.iter().find(|h| state.unknown.contains(&h.uuid())) {
            Some(unknown) => Err(HostError::unknown_accessory(unknown.uuid())),
            None => Ok(()),
        }
    }

    async fn unregister_platform_accessories(
        &self,
        plugin: &str,
        platform: &str,
        accessories: &[AccessoryHandle],
    ) -> Result<()> {
        let mut state = self.state();
        state.calls.push(HostCall::Unregister {
            plugin: plugin.to_string(),
            platform: platform.to_string(),
            uuids: uuids(accessories),
        });
        for handle in accessories {
            state.registered.remove(&handle.uuid());
        }
        Ok(())
    }
}

/// Handle for inspecting and steering a mock host.
#[derive(Debug, Clone)]
pub struct MockHostHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHostHandle {
    /// Make every registration that includes this identity fail.
    pub fn fail_registration(&self, uuid: AccessoryUuid) {
        self.state().refused.insert(uuid);
    }

    /// Make every update that includes this identity fail.
    pub fn fail_update(&self, uuid: AccessoryUuid) {
        self.state().unknown.insert(uuid);
    }

    /// Get every call received so far, in order.
    pub fn calls(&self) -> Vec<HostCall> {
        self.state().calls.clone()
    }

    /// Check whether an accessory is currently registered.
    pub fn registered(&self, uuid: AccessoryUuid) -> bool {
        self.state().registered.contains_key(&uuid)
    }

    /// Get the identities of all registered accessories, in order.
    pub fn registered_uuids(&self) -> Vec<AccessoryUuid> {
        self.state().registered.keys().copied().collect()
    }

    /// Get a registered accessory.
    pub fn accessory(&self, uuid: AccessoryUuid) -> Option<AccessoryHandle> {
        self.state().registered.get(&uuid).cloned()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[tokio::test]
    async fn test_register_records_call() {
        let (host, handle) = MockHost::new();
        let uuid = AccessoryUuid::generate("ABCD");
        let accessory = host.create_accessory("Bedroom", uuid, Category::AudioReceiver);

        host.register_platform_accessories("plugin", "platform", &[accessory])
            .await
            .unwrap();

        assert!(handle.registered(uuid));
        assert_eq!(handle.registered_uuids(), vec![uuid]);
        assert_eq!(
            handle.calls(),
            vec![HostCall::Register {
                plugin: "plugin".to_string(),
                platform: "platform".to_string(),
                uuids: vec![uuid],
            }]
        );
    }

    #[tokio::test]
    async fn test_fail_registration() {
        let (host, handle) = MockHost::new();
        let uuid = AccessoryUuid::generate("ABCD");
        handle.fail_registration(uuid);

        let accessory = host.create_accessory("Bedroom", uuid, Category::AudioReceiver);
        let result = host
            .register_platform_accessories("plugin", "platform", &[accessory])
            .await;

        assert!(matches!(result, Err(HostError::RegistrationFailed { .. })));
        assert!(!handle.registered(uuid));
        assert_eq!(handle.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_update() {
        let (host, handle) = MockHost::new();
        let uuid = AccessoryUuid::generate("ABCD");
        handle.fail_update(uuid);

        let accessory = host.create_accessory("Bedroom", uuid, Category::AudioReceiver);
        let result = host.update_platform_accessories(&[accessory]).await;

        assert!(matches!(result, Err(HostError::UnknownAccessory { .. })));
        assert_eq!(handle.calls(), vec![HostCall::Update { uuids: vec![uuid] }]);
    }

    #[tokio::test]
    async fn test_unregister_removes() {
        let (host, handle) = MockHost::new();
        let uuid = AccessoryUuid::generate("ABCD");
        let accessory = host.create_accessory("Bedroom", uuid, Category::AudioReceiver);

        host.register_platform_accessories("plugin", "platform", &[accessory.clone()])
            .await
            .unwrap();
        host.unregister_platform_accessories("plugin", "platform", &[accessory])
            .await
            .unwrap();

        assert!(!handle.registered(uuid));
        assert!(handle.accessory(uuid).is_none());
    }
}
