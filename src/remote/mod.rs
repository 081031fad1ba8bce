//! eLights remote API.
//!
//! The [`RemoteApi`] trait is the seam between the bridge core and the remote
//! lighting controller. [`ElightsClient`] talks to the real REST API.

mod client;
mod types;

pub use client::ElightsClient;
pub use types::{COMPONENT_ID_LEN, Component, ComponentKind, RemoteValue, decode_components};

use crate::error::Result;
use async_trait::async_trait;

/// Read and write access to the remote lighting controller.
#[async_trait]
pub trait RemoteApi: Send + Sync + 'static {
    /// Fetch the full inventory of supported components.
    async fn list_components(&self) -> Result<Vec<Component>>;

    /// Switch a relay output on or off.
    async fn set_switch(&self, id: &str, on: bool) -> Result<()>;

    /// Set a dimmer output to `percentage` (0 is off). Range is the caller's contract.
    async fn set_dimmer(&self, id: &str, percentage: u8) -> Result<()>;
}
