//! Mock ControlPlaneClient for unit testing
//!
//! Returns a configurable response without a running control plane and
//! records every token it was called with.

use crate::control_plane_trait::ControlPlaneClientTrait;
use crate::error::ControlPlaneError;
use crate::models::GatewayCerts;
use std::sync::{Arc, Mutex};

/// Mock ControlPlaneClient for testing
#[derive(Debug, Clone, Default)]
pub struct MockControlPlaneClient {
    gateway_certs: Arc<Mutex<Option<GatewayCerts>>>,
    failure: Arc<Mutex<Option<String>>>,
    tokens_seen: Arc<Mutex<Vec<String>>>,
}

impl MockControlPlaneClient {
    /// Create a new mock client with no gateway certs configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response of `get_gateway_certs` (for test setup)
    pub fn set_gateway_certs(&self, certs: GatewayCerts) {
        *self.gateway_certs.lock().unwrap() = Some(certs);
    }

    /// Make every call fail with an API error carrying `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Tokens passed to `get_gateway_certs`, in call order
    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ControlPlaneClientTrait for MockControlPlaneClient {
    async fn get_gateway_certs(&self, token: &str) -> Result<GatewayCerts, ControlPlaneError> {
        self.tokens_seen.lock().unwrap().push(token.to_string());

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(ControlPlaneError::Api(message));
        }

        self.gateway_certs
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| {
                ControlPlaneError::NotFound("gateway certs not configured in mock".to_string())
            })
    }
}
