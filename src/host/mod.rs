//! Local accessory host.
//!
//! The smart-home host owns accessory lifecycle and its own network protocol.
//! The bridge only needs the capability surface in [`AccessoryHost`].
//! [`LocalHost`] is the in-process implementation the binary runs with: it
//! keeps accessories in memory, restores them from a JSON cache at startup and
//! fans out characteristic changes to subscribers.

mod accessory;
mod cache;
mod characteristic;
mod notifier;

pub use accessory::{Accessory, AccessoryInfo, ServiceKind};
pub use cache::{AccessoryCache, CachedAccessory};
pub use characteristic::{Characteristic, CharacteristicKind, CharacteristicValue};
pub use notifier::{ChangeNotifier, CharacteristicEvent};

use log::{error, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the characteristic event channel.
const EVENT_CAPACITY: usize = 256;

/// Capabilities the bridge consumes from the smart-home host.
pub trait AccessoryHost: Send + Sync + 'static {
    /// An accessory the host already knows about (restored from its cache or
    /// registered earlier in this run).
    fn cached_accessory(&self, id: &str) -> Option<Arc<Accessory>>;

    /// Create a new, not yet registered accessory.
    fn create_accessory(&self, label: &str, id: &str) -> Arc<Accessory>;

    /// Publish an accessory to the host.
    fn register_accessory(&self, accessory: Arc<Accessory>);

    /// Remove accessories from the host.
    fn unregister_accessories(&self, accessories: &[Arc<Accessory>]);

    /// Every accessory the host currently knows, bound or not.
    fn accessories(&self) -> Vec<Arc<Accessory>>;
}

/// In-process accessory host backed by a JSON accessory cache.
pub struct LocalHost {
    cache_path: Option<PathBuf>,
    accessories: RwLock<HashMap<String, Arc<Accessory>>>,
    notifier: ChangeNotifier,
}

impl LocalHost {
    /// Create a host that restores from and persists to `cache_path`.
    pub fn new(cache_path: PathBuf) -> Self {
        let notifier = ChangeNotifier::new(EVENT_CAPACITY);
        let mut accessories = HashMap::new();

        for cached in AccessoryCache::load(&cache_path).accessories {
            let accessory = Arc::new(cached.restore());
            accessory.set_notifier(notifier.clone());
            info!("[Host] Loading accessory from cache: {}", accessory.label());
            accessories.insert(cached.id, accessory);
        }

        Self {
            cache_path: Some(cache_path),
            accessories: RwLock::new(accessories),
            notifier,
        }
    }

    /// Create a host without persistence.
    pub fn in_memory() -> Self {
        Self {
            cache_path: None,
            accessories: RwLock::new(HashMap::new()),
            notifier: ChangeNotifier::new(EVENT_CAPACITY),
        }
    }

    /// Subscribe to characteristic changes of all accessories.
    pub fn subscribe(&self) -> broadcast::Receiver<CharacteristicEvent> {
        self.notifier.subscribe()
    }

    pub fn len(&self) -> usize {
        self.accessories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessories.read().is_empty()
    }

    /// Write the current accessories, including characteristic values, to the cache.
    pub fn flush(&self) -> std::io::Result<()> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };
        let mut accessories: Vec<CachedAccessory> = self
            .accessories
            .read()
            .values()
            .map(|a| CachedAccessory::snapshot(a))
            .collect();
        accessories.sort_by(|a, b| a.id.cmp(&b.id));
        AccessoryCache { accessories }.save(path)
    }

    fn persist(&self) {
        if let Err(e) = self.flush() {
            error!("[Host] Failed to save accessory cache: {}", e);
        }
    }
}

impl AccessoryHost for LocalHost {
    fn cached_accessory(&self, id: &str) -> Option<Arc<Accessory>> {
        self.accessories.read().get(id).cloned()
    }

    fn create_accessory(&self, label: &str, id: &str) -> Arc<Accessory> {
        let accessory = Accessory::new(id, label);
        accessory.set_notifier(self.notifier.clone());
        Arc::new(accessory)
    }

    fn register_accessory(&self, accessory: Arc<Accessory>) {
        info!(
            "[Host] Registering accessory {} ({})",
            accessory.label(),
            accessory.id()
        );
        self.accessories
            .write()
            .insert(accessory.id().to_string(), accessory);
        self.persist();
    }

    fn unregister_accessories(&self, accessories: &[Arc<Accessory>]) {
        {
            let mut known = self.accessories.write();
            for accessory in accessories {
                known.remove(accessory.id());
            }
        }
        info!("[Host] Unregistered {} accessories", accessories.len());
        self.persist();
    }

    fn accessories(&self) -> Vec<Arc<Accessory>> {
        self.accessories.read().values().cloned().collect()
    }
}
