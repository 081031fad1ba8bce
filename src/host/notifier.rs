//! Change notifier for characteristic updates.
//!
//! When a characteristic value changes, the host must tell its own clients.
//! The notifier is the bridge between accessories and that fan-out.

use super::characteristic::{CharacteristicKind, CharacteristicValue};
use tokio::sync::broadcast;

/// A characteristic value that changed on an accessory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicEvent {
    pub accessory_id: String,
    pub kind: CharacteristicKind,
    pub value: CharacteristicValue,
}

/// Publishes characteristic changes to host subscribers.
///
/// Cloned into every accessory the host owns. Publishing never blocks; events
/// are dropped when nobody is subscribed.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<CharacteristicEvent>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CharacteristicEvent> {
        self.tx.subscribe()
    }

    pub fn notify(&self, event: CharacteristicEvent) {
        // Err only means there are no subscribers right now
        let _ = self.tx.send(event);
    }
}
