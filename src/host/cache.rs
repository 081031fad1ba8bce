//! Accessory cache persisted between runs.
//!
//! The host restores these accessories at startup so discovery can reuse them
//! instead of creating duplicates.

use super::accessory::{Accessory, ServiceKind};
use super::characteristic::{CharacteristicKind, CharacteristicValue};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted accessory - enough to rebuild it with its last known state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAccessory {
    pub id: String,
    pub label: String,
    pub service: Option<ServiceKind>,
    pub on: bool,
    pub brightness: u8,
}

impl CachedAccessory {
    pub fn snapshot(accessory: &Accessory) -> Self {
        Self {
            id: accessory.id().to_string(),
            label: accessory.label().to_string(),
            service: accessory.service(),
            on: accessory.is_on(),
            brightness: accessory.brightness(),
        }
    }

    /// Rebuild the accessory. Restored values bypass the change notifier.
    pub fn restore(&self) -> Accessory {
        let accessory = Accessory::new(&self.id, &self.label);
        if let Some(service) = self.service {
            accessory.set_service(service);
        }
        accessory
            .characteristic(CharacteristicKind::On)
            .set(CharacteristicValue::Bool(self.on));
        accessory
            .characteristic(CharacteristicKind::Brightness)
            .set(CharacteristicValue::Percent(self.brightness));
        accessory
    }
}

/// Persisted accessories state
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AccessoryCache {
    pub accessories: Vec<CachedAccessory>,
}

impl AccessoryCache {
    /// Load from file
    pub fn load(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => match serde_json::from_slice::<AccessoryCache>(&bytes) {
                Ok(cache) => {
                    info!(
                        "[Host] Loaded {} cached accessories from {:?}",
                        cache.accessories.len(),
                        path
                    );
                    cache
                }
                Err(e) => {
                    warn!("[Host] Failed to parse accessory cache: {}", e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[Host] No accessory cache found (first run)");
                Self::default()
            }
            Err(e) => {
                error!("[Host] Failed to read accessory cache: {}", e);
                Self::default()
            }
        }
    }

    /// Save to file
    pub fn save(&self, path: &PathBuf) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        info!(
            "[Host] Saved {} accessories to {:?}",
            self.accessories.len(),
            path
        );
        Ok(())
    }
}
