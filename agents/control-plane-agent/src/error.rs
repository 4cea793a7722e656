//! Agent bootstrap error types.
//!
//! Each variant names the startup stage that failed; the component error is
//! kept as the source so the full chain is printed on exit.

use crate::claims::ClaimError;
use crate::cluster::ClusterIdentityError;
use crate::credential::CredentialError;
use agent_proxy::{ProxyError, TlsError};
use control_plane_client::ControlPlaneError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the agent from starting.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to wait for control plane token")]
    WaitForToken(#[source] CredentialError),

    #[error("failed to read control plane id from token")]
    ReadControlPlaneId(#[source] ClaimError),

    #[error("failed to fetch public certs")]
    FetchPublicCerts(#[source] ControlPlaneError),

    #[error("failed to base64 decode provided jwt public key")]
    DecodePublicKey(#[source] base64::DecodeError),

    #[error("failed to parse public key")]
    ParsePublicKey(#[source] jsonwebtoken::errors::Error),

    #[error("failed to read xgql ca bundle file {path}")]
    ReadCaBundle {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to generate xgql ca cert pool")]
    BuildCaPool(#[source] TlsError),

    #[error("failed to read kube cluster ID")]
    ReadClusterId(#[source] ClusterIdentityError),

    #[error("cannot run agent proxy")]
    RunProxy(#[source] ProxyError),
}
