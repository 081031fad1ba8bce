//! Relay output adapter.
//!
//! Identity mapping between the accessory `On` characteristic and the remote
//! relay boolean.

use super::{LocalChange, WriteOutcome};
use crate::error::{BridgeError, Result};
use crate::host::{Accessory, CharacteristicKind, CharacteristicValue};
use crate::remote::{RemoteApi, RemoteValue};
use log::{debug, error, info};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct SwitchAdapter {
    id: String,
    accessory: Arc<Accessory>,
    remote: Arc<dyn RemoteApi>,
    /// Last value the remote is known to hold, `None` until first observed.
    last_remote: Mutex<Option<bool>>,
}

impl SwitchAdapter {
    pub fn new(accessory: Arc<Accessory>, remote: Arc<dyn RemoteApi>) -> Self {
        Self {
            id: accessory.id().to_string(),
            accessory,
            remote,
            last_remote: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn accessory(&self) -> &Arc<Accessory> {
        &self.accessory
    }

    pub fn last_remote(&self) -> Option<bool> {
        *self.last_remote.lock()
    }

    pub async fn apply_local_change(&self, change: LocalChange) -> Result<WriteOutcome> {
        let on = match change {
            LocalChange::On(on) => on,
            LocalChange::Brightness(level) => {
                return Err(BridgeError::invalid_value(
                    &self.id,
                    format!("brightness {level} on a relay"),
                ));
            }
        };

        info!("[Switch] {} was set to {}", self.id, on);
        self.accessory
            .update(CharacteristicKind::On, CharacteristicValue::Bool(on));

        if self.last_remote() == Some(on) {
            debug!("[Switch] {} already {} remotely, skipped", self.id, on);
            return Ok(WriteOutcome::Skipped);
        }

        match self.remote.set_switch(&self.id, on).await {
            Ok(()) => {
                *self.last_remote.lock() = Some(on);
                Ok(WriteOutcome::Written)
            }
            Err(e) => {
                error!("[Switch] Failed to update relay {}: {}", self.id, e);
                Err(e)
            }
        }
    }

    pub fn apply_remote_change(&self, value: &RemoteValue) -> Result<()> {
        let RemoteValue::Bool(on) = *value else {
            return Err(BridgeError::invalid_value(&self.id, value));
        };

        *self.last_remote.lock() = Some(on);
        if self
            .accessory
            .update(CharacteristicKind::On, CharacteristicValue::Bool(on))
        {
            info!("[Switch] {} detected change to {}", self.id, on);
        }
        Ok(())
    }
}
