//! Control plane API data models

use serde::{Deserialize, Serialize};

/// Trust material the gateway hands out to a connecting agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCerts {
    /// Base64 encoded PEM of the RSA key that signs tokens sent to the agent
    pub jwt_public_key: String,
    /// PEM CA bundle of the NATS server
    pub nats_ca: String,
}
