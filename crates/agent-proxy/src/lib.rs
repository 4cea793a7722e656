//! Agent Proxy
//!
//! Everything the control plane agent hands over to its serving runtime:
//!
//! - **Configuration**: the immutable [`AgentConfig`] assembled during bootstrap
//! - **Trust material**: [`TrustedCertPool`] built from a PEM CA bundle
//! - **Runtime**: the [`ProxyRuntime`] entry point and the TLS-terminating [`Proxy`]
//!
//! Request routing towards the Kubernetes API and NATS messaging are not
//! part of this crate; [`Proxy`] serves only the agent's probe endpoints.

pub mod config;
pub mod error;
pub mod server;
pub mod tls;

pub use config::{AgentConfig, ControlPlaneId, Credential, NatsClientConfig, ServeParams};
pub use error::{ProxyError, TlsError};
pub use server::{Proxy, ProxyRuntime};
pub use tls::{TrustedCertPool, generate_trusted_cert_pool, install_crypto_provider};
