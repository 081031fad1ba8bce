//! Discovery and reconciliation of remote components with local accessories.

use crate::adapter::Adapter;
use crate::error::Result;
use crate::host::AccessoryHost;
use crate::registry::ComponentRegistry;
use crate::remote::RemoteApi;
use log::{error, info};
use std::sync::Arc;

/// Outcome of one discovery pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Components bound to an accessory the host already knew.
    pub restored: usize,
    /// Components that got a newly created accessory.
    pub created: usize,
    /// Components whose initial value was rejected by the adapter.
    pub invalid_values: usize,
}

/// Populates the registry from the remote inventory.
pub struct DiscoveryEngine {
    remote: Arc<dyn RemoteApi>,
    host: Arc<dyn AccessoryHost>,
    registry: Arc<ComponentRegistry>,
}

impl DiscoveryEngine {
    pub fn new(
        remote: Arc<dyn RemoteApi>,
        host: Arc<dyn AccessoryHost>,
        registry: Arc<ComponentRegistry>,
    ) -> Self {
        Self {
            remote,
            host,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Fetch the inventory and bind an adapter to every component.
    ///
    /// A failed fetch aborts the pass before any accessory or registry entry
    /// is touched. Running the pass again with the same inventory changes
    /// nothing locally and writes nothing remotely.
    pub async fn run_discovery(&self) -> Result<DiscoveryReport> {
        let components = self.remote.list_components().await?;
        let mut report = DiscoveryReport::default();

        for component in components {
            let (accessory, is_new) = match self.host.cached_accessory(&component.id) {
                Some(accessory) => {
                    info!("[Discovery] Restoring component {}", component.id);
                    report.restored += 1;
                    (accessory, false)
                }
                None => {
                    info!(
                        "[Discovery] Discovered component {} ({} in {})",
                        component.id, component.name, component.room
                    );
                    report.created += 1;
                    let accessory = self
                        .host
                        .create_accessory(&component.label(), &component.id);
                    (accessory, true)
                }
            };

            let adapter = Adapter::bind(component.kind, accessory.clone(), self.remote.clone());
            if is_new {
                self.host.register_accessory(accessory);
            }

            if let Err(e) = adapter.apply_remote_change(&component.value) {
                error!("[Discovery] {}", e);
                report.invalid_values += 1;
            }

            self.registry.insert(adapter);
        }

        info!(
            "[Discovery] {} components ({} restored, {} new)",
            self.registry.len(),
            report.restored,
            report.created
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::host::{CharacteristicKind, LocalHost, ServiceKind};
    use crate::remote::fake::{FakeRemote, dimmer, switch};

    const RELAY: &str = "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0";
    const DIMMER: &str = "11111111-2222-3333-4444-555555555555";

    fn engine(remote: Arc<FakeRemote>, host: Arc<LocalHost>) -> DiscoveryEngine {
        DiscoveryEngine::new(remote, host, Arc::new(ComponentRegistry::new()))
    }

    #[tokio::test]
    async fn test_creates_and_applies_initial_values() {
        let remote = Arc::new(FakeRemote::with_components(vec![
            switch(RELAY, true),
            dimmer(DIMMER, 25),
        ]));
        let host = Arc::new(LocalHost::in_memory());
        let engine = engine(remote.clone(), host.clone());

        let report = engine.run_discovery().await.unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(report.restored, 0);
        assert_eq!(engine.registry().len(), 2);
        assert_eq!(host.len(), 2);

        let relay = host.cached_accessory(RELAY).unwrap();
        assert_eq!(relay.label(), "Kitchen Ceiling");
        assert_eq!(relay.service(), Some(ServiceKind::Outlet));
        assert!(relay.is_on());

        let spots = host.cached_accessory(DIMMER).unwrap();
        assert!(spots.is_on());
        assert_eq!(spots.brightness(), 25);

        assert!(remote.writes().is_empty());
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let remote = Arc::new(FakeRemote::with_components(vec![
            switch(RELAY, false),
            dimmer(DIMMER, 0),
        ]));
        let host = Arc::new(LocalHost::in_memory());
        let engine = engine(remote.clone(), host.clone());

        engine.run_discovery().await.unwrap();
        let accessory = host.cached_accessory(DIMMER).unwrap();
        let version = accessory.characteristic(CharacteristicKind::On).version();

        let report = engine.run_discovery().await.unwrap();
        assert_eq!(report.restored, 2);
        assert_eq!(report.created, 0);
        assert_eq!(engine.registry().len(), 2);
        assert_eq!(host.len(), 2);
        assert!(Arc::ptr_eq(&accessory, &host.cached_accessory(DIMMER).unwrap()));
        assert_eq!(
            accessory.characteristic(CharacteristicKind::On).version(),
            version
        );
        assert!(remote.writes().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_registry() {
        let remote = Arc::new(FakeRemote::with_components(vec![switch(RELAY, false)]));
        let host = Arc::new(LocalHost::in_memory());
        let engine = engine(remote.clone(), host.clone());
        engine.run_discovery().await.unwrap();

        let remote = Arc::new(FakeRemote::unavailable());
        let failing = DiscoveryEngine::new(remote, host.clone(), engine.registry().clone());
        let result = failing.run_discovery().await;

        assert!(matches!(result, Err(BridgeError::RemoteUnavailable(_))));
        assert_eq!(engine.registry().len(), 1);
        assert_eq!(host.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_first_fetch_leaves_everything_empty() {
        let host = Arc::new(LocalHost::in_memory());
        let engine = engine(Arc::new(FakeRemote::unavailable()), host.clone());

        assert!(engine.run_discovery().await.is_err());
        assert!(engine.registry().is_empty());
        assert!(host.is_empty());
    }

    #[tokio::test]
    async fn test_vanished_component_is_kept() {
        let remote = Arc::new(FakeRemote::with_components(vec![
            switch(RELAY, false),
            dimmer(DIMMER, 10),
        ]));
        let host = Arc::new(LocalHost::in_memory());
        let engine = engine(remote.clone(), host.clone());
        engine.run_discovery().await.unwrap();

        remote.set_components(vec![switch(RELAY, true)]);
        engine.run_discovery().await.unwrap();

        assert_eq!(engine.registry().len(), 2);
        assert!(engine.registry().get(DIMMER).is_some());
    }

    #[tokio::test]
    async fn test_invalid_initial_value_still_binds() {
        let remote = Arc::new(FakeRemote::with_components(vec![dimmer(DIMMER, 140)]));
        let host = Arc::new(LocalHost::in_memory());
        let engine = engine(remote, host.clone());

        let report = engine.run_discovery().await.unwrap();
        assert_eq!(report.invalid_values, 1);
        assert_eq!(engine.registry().len(), 1);
        assert!(!host.cached_accessory(DIMMER).unwrap().is_on());
    }
}
