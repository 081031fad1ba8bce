//! Local accessory representation.

use super::characteristic::{Characteristic, CharacteristicKind, CharacteristicValue};
use super::notifier::{ChangeNotifier, CharacteristicEvent};
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Service an accessory is exposed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum ServiceKind {
    /// Plain on/off outlet (relay outputs).
    Outlet,
    /// Dimmable light (dimmer outputs).
    Lightbulb,
}

impl ServiceKind {
    pub fn characteristics(self) -> &'static [CharacteristicKind] {
        match self {
            Self::Outlet => &[CharacteristicKind::On],
            Self::Lightbulb => &[CharacteristicKind::On, CharacteristicKind::Brightness],
        }
    }
}

/// Manufacturer / model / serial shown by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryInfo {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

/// A locally addressable accessory, keyed by the component id.
///
/// Characteristic slots exist for every capability; which ones the host
/// exposes depends on the configured [`ServiceKind`].
pub struct Accessory {
    id: String,
    label: String,
    service: RwLock<Option<ServiceKind>>,
    info: RwLock<Option<AccessoryInfo>>,
    on: Characteristic,
    brightness: Characteristic,
    notifier: RwLock<Option<ChangeNotifier>>,
}

impl Accessory {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            service: RwLock::new(None),
            info: RwLock::new(None),
            on: Characteristic::new(CharacteristicKind::On, CharacteristicValue::Bool(false)),
            brightness: Characteristic::new(
                CharacteristicKind::Brightness,
                CharacteristicValue::Percent(0),
            ),
            notifier: RwLock::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn service(&self) -> Option<ServiceKind> {
        *self.service.read()
    }

    pub fn info(&self) -> Option<AccessoryInfo> {
        self.info.read().clone()
    }

    /// Set the service kind and information block. Called when an adapter binds.
    pub fn configure(&self, service: ServiceKind, info: AccessoryInfo) {
        *self.service.write() = Some(service);
        *self.info.write() = Some(info);
    }

    pub(crate) fn set_service(&self, service: ServiceKind) {
        *self.service.write() = Some(service);
    }

    pub(crate) fn set_notifier(&self, notifier: ChangeNotifier) {
        *self.notifier.write() = Some(notifier);
    }

    pub fn characteristic(&self, kind: CharacteristicKind) -> &Characteristic {
        match kind {
            CharacteristicKind::On => &self.on,
            CharacteristicKind::Brightness => &self.brightness,
        }
    }

    pub fn get(&self, kind: CharacteristicKind) -> CharacteristicValue {
        self.characteristic(kind).get()
    }

    /// Update a characteristic and notify the host, but only if the value changed.
    pub fn update(&self, kind: CharacteristicKind, value: CharacteristicValue) -> bool {
        let characteristic = self.characteristic(kind);
        if !characteristic.set(value) {
            return false;
        }

        let value = characteristic.get();
        debug!("[Host] {} {} -> {}", self.id, kind, value);
        if let Some(notifier) = self.notifier.read().as_ref() {
            notifier.notify(CharacteristicEvent {
                accessory_id: self.id.clone(),
                kind,
                value,
            });
        }
        true
    }

    pub fn is_on(&self) -> bool {
        self.get(CharacteristicKind::On).as_bool()
    }

    pub fn brightness(&self) -> u8 {
        self.get(CharacteristicKind::Brightness).as_percent()
    }
}

impl std::fmt::Debug for Accessory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessory")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("service", &self.service())
            .field("on", &self.is_on())
            .field("brightness", &self.brightness())
            .finish()
    }
}
