//! Accessory adapters.
//!
//! An adapter sits between one remote component and its local accessory. It
//! translates values in both directions and keeps the last value the remote is
//! known to hold, so a change is never written back to the side it came from.
//!
//! - `apply_local_change`: the host commanded a change; validate, mirror it on
//!   the accessory, and write it to the remote unless the remote already holds it.
//! - `apply_remote_change`: the remote reported a value; validate, remember it,
//!   and update the accessory only where it differs. Never performs I/O.

mod dimmer;
mod switch;

pub use dimmer::{DEFAULT_BRIGHTNESS, DimmerAdapter};
pub use switch::SwitchAdapter;

use crate::error::Result;
use crate::host::{Accessory, AccessoryInfo, ServiceKind};
use crate::remote::{ComponentKind, RemoteApi, RemoteValue};
use std::sync::Arc;

/// Manufacturer reported for every bridged accessory.
pub const MANUFACTURER: &str = "Mattias Holmlund";

/// A change commanded on the local side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalChange {
    On(bool),
    /// Brightness percentage; anything outside 0..=100 is rejected.
    Brightness(i64),
}

/// Whether a local change reached the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The remote already holds the value.
    Skipped,
}

/// Adapter for one component, by kind.
pub enum Adapter {
    Switch(SwitchAdapter),
    Dimmer(DimmerAdapter),
}

impl Adapter {
    /// Bind a fresh adapter of `kind` to `accessory`, configuring its service
    /// and information block.
    pub fn bind(kind: ComponentKind, accessory: Arc<Accessory>, remote: Arc<dyn RemoteApi>) -> Self {
        let service = match kind {
            ComponentKind::Switch => ServiceKind::Outlet,
            ComponentKind::Dimmer => ServiceKind::Lightbulb,
        };
        accessory.configure(
            service,
            AccessoryInfo {
                manufacturer: MANUFACTURER.to_string(),
                model: kind.to_string(),
                serial_number: accessory.id().to_string(),
            },
        );

        match kind {
            ComponentKind::Switch => Self::Switch(SwitchAdapter::new(accessory, remote)),
            ComponentKind::Dimmer => Self::Dimmer(DimmerAdapter::new(accessory, remote)),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Switch(a) => a.id(),
            Self::Dimmer(a) => a.id(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Switch(_) => ComponentKind::Switch,
            Self::Dimmer(_) => ComponentKind::Dimmer,
        }
    }

    pub fn accessory(&self) -> &Arc<Accessory> {
        match self {
            Self::Switch(a) => a.accessory(),
            Self::Dimmer(a) => a.accessory(),
        }
    }

    pub async fn apply_local_change(&self, change: LocalChange) -> Result<WriteOutcome> {
        match self {
            Self::Switch(a) => a.apply_local_change(change).await,
            Self::Dimmer(a) => a.apply_local_change(change).await,
        }
    }

    pub fn apply_remote_change(&self, value: &RemoteValue) -> Result<()> {
        match self {
            Self::Switch(a) => a.apply_remote_change(value),
            Self::Dimmer(a) => a.apply_remote_change(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::FakeRemote;

    #[test]
    fn test_bind_configures_accessory() {
        let remote: Arc<dyn RemoteApi> = Arc::new(FakeRemote::default());

        let relay = Arc::new(Accessory::new("r", "Kitchen Ceiling"));
        let adapter = Adapter::bind(ComponentKind::Switch, relay.clone(), remote.clone());
        assert_eq!(adapter.kind(), ComponentKind::Switch);
        assert_eq!(relay.service(), Some(ServiceKind::Outlet));
        let info = relay.info().unwrap();
        assert_eq!(info.manufacturer, "Mattias Holmlund");
        assert_eq!(info.model, "RelayOutput");
        assert_eq!(info.serial_number, "r");

        let dimmer = Arc::new(Accessory::new("d", "Hall Spots"));
        let adapter = Adapter::bind(ComponentKind::Dimmer, dimmer.clone(), remote);
        assert_eq!(adapter.id(), "d");
        assert_eq!(dimmer.service(), Some(ServiceKind::Lightbulb));
        assert_eq!(dimmer.info().unwrap().model, "DimmerOutput");
    }
}
