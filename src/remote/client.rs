//! HTTP client for the eLights REST API.

use super::RemoteApi;
use super::types::{Component, decode_components};
use crate::config::RemoteConfig;
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;

/// Body of `PUT /api/uuid/{uuid}`.
#[derive(Debug, Serialize)]
struct SetValue<T> {
    value: T,
}

/// Stateless wrapper around the eLights API.
///
/// Every call is a single attempt; failures are handed back to the caller.
pub struct ElightsClient {
    http: Client,
    base_url: Url,
}

impl ElightsClient {
    /// Create a client from configuration.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("elights-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::RemoteUnavailable(format!("failed to build HTTP client: {e}")))?;
        Self::from_reqwest(&config.base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: Client) -> Result<Self> {
        // Url::join drops the last segment unless the base ends in '/'
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalized).map_err(|e| BridgeError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self { http, base_url })
    }

    fn component_url(&self, id: &str) -> Result<Url> {
        self.base_url
            .join(&format!("uuid/{id}"))
            .map_err(|e| BridgeError::InvalidUrl(e.to_string()))
    }

    async fn put_value<T: Serialize + Sync>(&self, id: &str, value: T) -> Result<()> {
        let url = self.component_url(id)?;
        debug!("[Remote] PUT {url}");

        let response = self
            .http
            .put(url)
            .json(&SetValue { value })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::RemoteRejected {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteApi for ElightsClient {
    async fn list_components(&self) -> Result<Vec<Component>> {
        let url = self
            .base_url
            .join("uuid")
            .map_err(|e| BridgeError::InvalidUrl(e.to_string()))?;
        debug!("[Remote] GET {url}");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::RemoteUnavailable(format!(
                "component list returned HTTP {status}"
            )));
        }

        let body = response.bytes().await?;
        let components = decode_components(&body)?;
        info!("[Remote] Fetched {} components", components.len());
        Ok(components)
    }

    async fn set_switch(&self, id: &str, on: bool) -> Result<()> {
        self.put_value(id, on).await
    }

    async fn set_dimmer(&self, id: &str, percentage: u8) -> Result<()> {
        self.put_value(id, percentage).await
    }
}
