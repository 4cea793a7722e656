//! ControlPlaneClient trait for mocking
//!
//! The agent's bootstrap depends on this trait rather than on the concrete
//! HTTP client, so tests can substitute `MockControlPlaneClient`.

use crate::error::ControlPlaneError;
use crate::models::GatewayCerts;

/// Trait for control plane API operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ControlPlaneClientTrait: Send + Sync {
    /// Exchange a control plane token for the gateway's public key and NATS CA
    async fn get_gateway_certs(&self, token: &str) -> Result<GatewayCerts, ControlPlaneError>;
}
