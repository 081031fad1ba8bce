//! Characteristic slots on a local accessory.
//!
//! A slot stores its value in an atomic and carries a version counter that is
//! bumped only when the value actually changes, so redundant updates never
//! reach subscribers.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use strum::Display;

/// Capability a characteristic exposes to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum CharacteristicKind {
    On,
    Brightness,
}

/// A characteristic value as the host sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacteristicValue {
    Bool(bool),
    Percent(u8),
}

impl CharacteristicValue {
    fn encode(self, kind: CharacteristicKind) -> u8 {
        match (kind, self) {
            (CharacteristicKind::On, Self::Bool(b)) => b as u8,
            (CharacteristicKind::On, Self::Percent(p)) => (p > 0) as u8,
            (CharacteristicKind::Brightness, Self::Bool(b)) => if b { 100 } else { 0 },
            (CharacteristicKind::Brightness, Self::Percent(p)) => p.min(100),
        }
    }

    fn decode(kind: CharacteristicKind, raw: u8) -> Self {
        match kind {
            CharacteristicKind::On => Self::Bool(raw != 0),
            CharacteristicKind::Brightness => Self::Percent(raw),
        }
    }

    pub fn as_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Percent(p) => p > 0,
        }
    }

    pub fn as_percent(self) -> u8 {
        match self {
            Self::Bool(b) => if b { 100 } else { 0 },
            Self::Percent(p) => p,
        }
    }
}

impl std::fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// Thread-safe characteristic state.
pub struct Characteristic {
    kind: CharacteristicKind,
    value: AtomicU8,
    version: AtomicU32,
}

impl Characteristic {
    pub fn new(kind: CharacteristicKind, initial: CharacteristicValue) -> Self {
        Self {
            kind,
            value: AtomicU8::new(initial.encode(kind)),
            version: AtomicU32::new(0),
        }
    }

    pub fn kind(&self) -> CharacteristicKind {
        self.kind
    }

    pub fn get(&self) -> CharacteristicValue {
        CharacteristicValue::decode(self.kind, self.value.load(Ordering::SeqCst))
    }

    /// Store a new value. Returns `true` (and bumps the version) only if it changed.
    pub fn set(&self, value: CharacteristicValue) -> bool {
        let raw = value.encode(self.kind);
        let old = self.value.swap(raw, Ordering::SeqCst);
        if old != raw {
            self.version.fetch_add(1, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Number of actual value changes since creation.
    pub fn version(&self) -> u32 {
        self.version.load(Ordering::SeqCst)
    }
}
