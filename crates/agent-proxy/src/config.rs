//! Runtime configuration handed to the proxy.
//!
//! An [`AgentConfig`] is assembled exactly once during startup and is never
//! mutated afterwards. It is shared with the serving runtime as
//! `Arc<AgentConfig>`.

use crate::tls::TrustedCertPool;
use jsonwebtoken::DecodingKey;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use uuid::Uuid;

/// Bearer token proving which control plane this agent belongs to.
///
/// Never empty once produced by the token waiter. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<redacted {} bytes>)", self.0.len())
    }
}

/// Identifier of the control plane this agent serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlPlaneId(Uuid);

impl ControlPlaneId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ControlPlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical lowercase hyphenated form
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

/// Connection details for the NATS messaging transport.
#[derive(Clone)]
pub struct NatsClientConfig {
    /// Client name, the agent pod name
    pub name: String,
    pub endpoint: String,
    /// Endpoint that issues NATS user JWTs in exchange for the control plane token
    pub jwt_endpoint: String,
    pub control_plane_token: Credential,
    /// PEM CA bundle for the NATS server, as returned by the control plane API
    pub ca_bundle: String,
}

impl fmt::Debug for NatsClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NatsClientConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("jwt_endpoint", &self.jwt_endpoint)
            .field("control_plane_token", &self.control_plane_token)
            .field("ca_bundle_bytes", &self.ca_bundle.len())
            .finish()
    }
}

/// Immutable agent configuration produced by bootstrap.
#[derive(Clone)]
pub struct AgentConfig {
    pub debug_mode: bool,
    pub control_plane_id: ControlPlaneId,
    /// Verifies tokens presented to the agent by the control plane
    pub token_rsa_public_key: DecodingKey,
    /// Roots for xgql's serving certificate; `None` means platform roots
    pub xgql_ca_cert_pool: Option<TrustedCertPool>,
    /// UID of the `kube-system` namespace
    pub cluster_id: String,
    pub nats: NatsClientConfig,
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("debug_mode", &self.debug_mode)
            .field("control_plane_id", &self.control_plane_id)
            .field("token_rsa_public_key", &"<rsa public key>")
            .field("xgql_ca_cert_pool", &self.xgql_ca_cert_pool)
            .field("cluster_id", &self.cluster_id)
            .field("nats", &self.nats)
            .finish()
    }
}

/// Where and how the proxy serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeParams {
    pub addr: SocketAddr,
    pub tls_cert_file: PathBuf,
    pub tls_key_file: PathBuf,
}
