//! Control plane API client
//!
//! Implements the calls the agent makes to the control plane API during
//! startup. Requests authenticate with the agent's control plane token as a
//! bearer token.

use crate::control_plane_trait::ControlPlaneClientTrait;
use crate::error::ControlPlaneError;
use crate::models::GatewayCerts;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Path of the gateway certificate endpoint
const GATEWAY_CERTS_PATH: &str = "/v1/gw/certs";

/// Control plane API client
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    client: Client,
    base_url: String,
    debug: bool,
}

impl ControlPlaneClient {
    /// Create a new control plane client
    ///
    /// # Arguments
    /// * `base_url` - Control plane API base URL (e.g., "https://api.upbound.io")
    /// * `debug` - Log response bodies at debug level
    pub fn new(base_url: String, debug: bool) -> Result<Self, ControlPlaneError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ControlPlaneError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            debug,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the gateway's token signing key and the NATS CA bundle.
    ///
    /// # Arguments
    /// * `token` - Control plane token of this agent
    ///
    /// # Returns
    /// * `Ok(GatewayCerts)` - Public key (base64 PEM) and NATS CA
    /// * `Err(ControlPlaneError)` - If the token is rejected or the request fails
    pub async fn get_gateway_certs(&self, token: &str) -> Result<GatewayCerts, ControlPlaneError> {
        let url = format!("{}{}", self.base_url, GATEWAY_CERTS_PATH);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ControlPlaneError::Authentication(format!(
                "control plane token rejected: {} - {}",
                status, body
            )));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ControlPlaneError::NotFound(format!(
                "{} not found at {}",
                GATEWAY_CERTS_PATH, self.base_url
            )));
        }

        if !status.is_success() {
            return Err(ControlPlaneError::Api(format!(
                "GET {} failed: {} - {}",
                GATEWAY_CERTS_PATH, status, body
            )));
        }

        if self.debug {
            debug!(body = %body, "Gateway certs response");
        }

        serde_json::from_str(&body).map_err(|e| {
            ControlPlaneError::Api(format!(
                "error decoding response body: {} - Response (first 500 chars): {}",
                e,
                body.chars().take(500).collect::<String>()
            ))
        })
    }
}

#[async_trait::async_trait]
impl ControlPlaneClientTrait for ControlPlaneClient {
    async fn get_gateway_certs(&self, token: &str) -> Result<GatewayCerts, ControlPlaneError> {
        self.get_gateway_certs(token).await
    }
}
