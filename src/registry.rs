//! Component registry: component id to bound adapter.

use crate::adapter::{Adapter, LocalChange, WriteOutcome};
use crate::error::{BridgeError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Single source of truth for which accessories the bridge manages.
///
/// Holds at most one adapter per id. Entries only disappear through
/// [`ComponentRegistry::clear`].
#[derive(Default)]
pub struct ComponentRegistry {
    adapters: RwLock<HashMap<String, Arc<Adapter>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the adapter for its id. Returns the replaced adapter.
    pub fn insert(&self, adapter: Adapter) -> Option<Arc<Adapter>> {
        let id = adapter.id().to_string();
        self.adapters.write().insert(id, Arc::new(adapter))
    }

    pub fn get(&self, id: &str) -> Option<Arc<Adapter>> {
        self.adapters.read().get(id).cloned()
    }

    /// Like [`get`](Self::get), but an absent id is an `UnknownComponent` error.
    pub fn lookup(&self, id: &str) -> Result<Arc<Adapter>> {
        self.get(id)
            .ok_or_else(|| BridgeError::UnknownComponent(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.adapters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.read().is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.adapters.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Remove every entry, returning the adapters that were registered.
    pub fn clear(&self) -> Vec<Arc<Adapter>> {
        self.adapters.write().drain().map(|(_, a)| a).collect()
    }

    /// Route a host command to the adapter for `id`.
    ///
    /// The registry lock is released before the remote write is awaited.
    pub async fn dispatch_local(&self, id: &str, change: LocalChange) -> Result<WriteOutcome> {
        let adapter = self.lookup(id)?;
        adapter.apply_local_change(change).await
    }
}
