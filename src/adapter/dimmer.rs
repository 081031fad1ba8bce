//! Dimmer output adapter.
//!
//! The accessory side is a pair (on, brightness); the remote side is a single
//! level in 0..=100 where 0 means off. Brightness is remembered across off
//! periods so turning the light back on restores the previous level.

use super::{LocalChange, WriteOutcome};
use crate::error::{BridgeError, Result};
use crate::host::{Accessory, CharacteristicKind, CharacteristicValue};
use crate::remote::{RemoteApi, RemoteValue};
use log::{debug, error, info};
use parking_lot::Mutex;
use std::sync::Arc;

/// Level used when nothing better is known.
pub const DEFAULT_BRIGHTNESS: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DimmerState {
    on: bool,
    /// Last nonzero level, kept while off.
    brightness: u8,
    /// Last level the remote is known to hold, `None` until first observed.
    last_remote: Option<u8>,
}

impl DimmerState {
    fn remote_level(&self) -> u8 {
        if self.on { self.brightness } else { 0 }
    }
}

pub struct DimmerAdapter {
    id: String,
    accessory: Arc<Accessory>,
    remote: Arc<dyn RemoteApi>,
    state: Mutex<DimmerState>,
}

impl DimmerAdapter {
    /// Bind to an accessory, picking up its current on/brightness values.
    pub fn new(accessory: Arc<Accessory>, remote: Arc<dyn RemoteApi>) -> Self {
        let brightness = match accessory.brightness() {
            0 => DEFAULT_BRIGHTNESS,
            level => level,
        };
        let state = DimmerState {
            on: accessory.is_on(),
            brightness,
            last_remote: None,
        };
        Self {
            id: accessory.id().to_string(),
            accessory,
            remote,
            state: Mutex::new(state),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn accessory(&self) -> &Arc<Accessory> {
        &self.accessory
    }

    pub fn last_remote(&self) -> Option<u8> {
        self.state.lock().last_remote
    }

    /// Remembered brightness, valid even while the dimmer is off.
    pub fn brightness(&self) -> u8 {
        self.state.lock().brightness
    }

    pub async fn apply_local_change(&self, change: LocalChange) -> Result<WriteOutcome> {
        let state = {
            let mut state = self.state.lock();
            match change {
                LocalChange::On(on) => state.on = on,
                LocalChange::Brightness(level) => match u8::try_from(level) {
                    Ok(0) => state.on = false,
                    Ok(level @ 1..=100) => {
                        state.brightness = level;
                        state.on = true;
                    }
                    _ => return Err(BridgeError::invalid_value(&self.id, level)),
                },
            }
            *state
        };

        let target = state.remote_level();
        info!(
            "[Dimmer] {} set to on={} brightness={}",
            self.id, state.on, state.brightness
        );
        self.push_local(&state);

        if state.last_remote == Some(target) {
            debug!("[Dimmer] {} already at {} remotely, skipped", self.id, target);
            return Ok(WriteOutcome::Skipped);
        }

        match self.remote.set_dimmer(&self.id, target).await {
            Ok(()) => {
                self.state.lock().last_remote = Some(target);
                Ok(WriteOutcome::Written)
            }
            Err(e) => {
                error!("[Dimmer] Failed to set dimmer {} to {}: {}", self.id, target, e);
                Err(e)
            }
        }
    }

    pub fn apply_remote_change(&self, value: &RemoteValue) -> Result<()> {
        let level = match *value {
            RemoteValue::Number(n @ 0..=100) => n as u8,
            _ => return Err(BridgeError::invalid_value(&self.id, value)),
        };

        let state = {
            let mut state = self.state.lock();
            state.last_remote = Some(level);
            if level == 0 {
                state.on = false;
            } else {
                state.on = true;
                state.brightness = level;
            }
            *state
        };

        if self.push_local(&state) {
            info!("[Dimmer] {} detected change to {}", self.id, level);
        }
        Ok(())
    }

    /// Mirror state onto the accessory. Returns whether anything changed.
    fn push_local(&self, state: &DimmerState) -> bool {
        let on_changed = self
            .accessory
            .update(CharacteristicKind::On, CharacteristicValue::Bool(state.on));
        let brightness_changed = self.accessory.update(
            CharacteristicKind::Brightness,
            CharacteristicValue::Percent(state.brightness),
        );
        on_changed || brightness_changed
    }
}
