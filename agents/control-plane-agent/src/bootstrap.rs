//! Agent bootstrap.
//!
//! Runs the startup sequence once and hands the result to the proxy runtime:
//!
//! 1. Wait for the control plane token to be mounted
//! 2. Read the control plane id from the token
//! 3. Exchange the token for the gateway's public key and the NATS CA
//! 4. Build the xgql trust pool, if a CA bundle is configured
//! 5. Read the cluster id from the `kube-system` namespace
//! 6. Assemble the [`AgentConfig`] and run the proxy
//!
//! Every failure is fatal. There is no partially configured mode.

use crate::claims::read_control_plane_id;
use crate::cli::AgentArgs;
use crate::cluster::{NamespaceReader, read_kube_cluster_id};
use crate::credential::{CONTROL_PLANE_TOKEN_CHECK_PERIOD, wait_for_control_plane_token};
use crate::error::BootstrapError;
use agent_proxy::{
    AgentConfig, NatsClientConfig, ProxyRuntime, TrustedCertPool, generate_trusted_cert_pool,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use control_plane_client::ControlPlaneClientTrait;
use jsonwebtoken::DecodingKey;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Startup sequence of the agent and the collaborators it talks to.
pub struct Bootstrap {
    args: AgentArgs,
    debug: bool,
    token_check_period: Duration,
    control_plane: Arc<dyn ControlPlaneClientTrait>,
    namespaces: Arc<dyn NamespaceReader>,
    proxy: Arc<dyn ProxyRuntime>,
}

impl Bootstrap {
    pub fn new(
        args: AgentArgs,
        debug: bool,
        control_plane: Arc<dyn ControlPlaneClientTrait>,
        namespaces: Arc<dyn NamespaceReader>,
        proxy: Arc<dyn ProxyRuntime>,
    ) -> Self {
        Self {
            args,
            debug,
            token_check_period: CONTROL_PLANE_TOKEN_CHECK_PERIOD,
            control_plane,
            namespaces,
            proxy,
        }
    }

    /// Overrides how often the token file is polled.
    #[must_use]
    pub fn with_token_check_period(mut self, period: Duration) -> Self {
        self.token_check_period = period;
        self
    }

    /// Runs steps 1 to 5 and returns the assembled configuration.
    pub async fn assemble(
        &self,
        cancel: &CancellationToken,
    ) -> Result<AgentConfig, BootstrapError> {
        let token = wait_for_control_plane_token(
            &self.args.control_plane_token_path,
            self.token_check_period,
            cancel,
        )
        .await
        .map_err(BootstrapError::WaitForToken)?;

        let control_plane_id =
            read_control_plane_id(token.as_str()).map_err(BootstrapError::ReadControlPlaneId)?;

        let certs = self
            .control_plane
            .get_gateway_certs(token.as_str())
            .await
            .map_err(BootstrapError::FetchPublicCerts)?;
        let token_rsa_public_key = parse_token_public_key(&certs.jwt_public_key)?;

        let xgql_ca_cert_pool = match &self.args.xgql_ca_bundle_file {
            Some(path) => Some(load_trusted_cert_pool(path).await?),
            None => None,
        };

        let cluster_id = read_kube_cluster_id(self.namespaces.as_ref())
            .await
            .map_err(BootstrapError::ReadClusterId)?;

        Ok(AgentConfig {
            debug_mode: self.debug,
            control_plane_id,
            token_rsa_public_key,
            xgql_ca_cert_pool,
            cluster_id,
            nats: NatsClientConfig {
                name: self.args.pod_name.clone(),
                endpoint: self.args.nats_endpoint.clone(),
                jwt_endpoint: self.args.upbound_api_endpoint.clone(),
                control_plane_token: token,
                ca_bundle: certs.nats_ca,
            },
        })
    }

    /// Assembles the configuration, then blocks in the proxy runtime.
    pub async fn run(self, cancel: &CancellationToken) -> Result<(), BootstrapError> {
        let config = Arc::new(self.assemble(cancel).await?);
        let args = &self.args;

        info!(
            version = env!("CARGO_PKG_VERSION"),
            control_plane_id = %config.control_plane_id,
            cluster_id = %config.cluster_id,
            debug = self.debug,
            pod_name = %args.pod_name,
            server_port = args.server_port,
            tls_cert_file = %args.tls_cert_file.display(),
            tls_private_key_file = %args.tls_key_file.display(),
            xgql_ca_bundle_file = ?args.xgql_ca_bundle_file,
            nats_endpoint = %args.nats_endpoint,
            upbound_api_endpoint = %args.upbound_api_endpoint,
            "Starting control plane agent"
        );

        self.proxy
            .run(config, args.serve_params())
            .await
            .map_err(BootstrapError::RunProxy)
    }
}

/// Decodes the base64 PEM returned by the control plane into an RSA key.
fn parse_token_public_key(encoded: &str) -> Result<DecodingKey, BootstrapError> {
    let pem = STANDARD
        .decode(encoded.trim())
        .map_err(BootstrapError::DecodePublicKey)?;
    DecodingKey::from_rsa_pem(&pem).map_err(BootstrapError::ParsePublicKey)
}

async fn load_trusted_cert_pool(path: &Path) -> Result<TrustedCertPool, BootstrapError> {
    let pem = tokio::fs::read(path)
        .await
        .map_err(|source| BootstrapError::ReadCaBundle {
            path: path.to_path_buf(),
            source,
        })?;
    generate_trusted_cert_pool(&pem).map_err(BootstrapError::BuildCaPool)
}
