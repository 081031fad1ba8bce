//! eLights bridge library.
//!
//! Exposes the relay and dimmer outputs of an eLights lighting controller as
//! local smart-home accessories and keeps both sides in sync.

pub mod adapter;
pub mod config;
pub mod console;
pub mod discovery;
pub mod error;
pub mod host;
pub mod instance_lock;
pub mod listener;
pub mod registry;
pub mod remote;

pub use adapter::{Adapter, LocalChange, WriteOutcome};
pub use discovery::{DiscoveryEngine, DiscoveryReport};
pub use error::{BridgeError, Result};
pub use host::{Accessory, AccessoryHost, LocalHost};
pub use listener::ListenerState;
pub use registry::ComponentRegistry;
pub use remote::{Component, ComponentKind, ElightsClient, RemoteApi, RemoteValue};
