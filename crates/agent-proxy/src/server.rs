//! Serving entry point for the agent.
//!
//! Bootstrap hands a finished [`AgentConfig`] to a [`ProxyRuntime`], which owns
//! all network serving from then on. [`Proxy`] terminates TLS on the configured
//! address and serves the agent's probe endpoints until shut down.

use crate::config::{AgentConfig, ServeParams};
use crate::error::ProxyError;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// How long in-flight connections may drain after shutdown is requested
const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Entry point the bootstrap hands its configuration to.
///
/// `run` blocks for as long as the runtime serves traffic.
#[async_trait::async_trait]
pub trait ProxyRuntime: Send + Sync {
    async fn run(&self, config: Arc<AgentConfig>, params: ServeParams) -> Result<(), ProxyError>;
}

/// TLS-terminating agent server.
#[derive(Debug, Clone)]
pub struct Proxy {
    shutdown: CancellationToken,
}

impl Proxy {
    /// Creates a proxy that stops serving once `shutdown` is cancelled.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }
}

#[async_trait::async_trait]
impl ProxyRuntime for Proxy {
    async fn run(&self, config: Arc<AgentConfig>, params: ServeParams) -> Result<(), ProxyError> {
        let tls_config = RustlsConfig::from_pem_file(&params.tls_cert_file, &params.tls_key_file)
            .await
            .map_err(|source| ProxyError::TlsKeyPair {
                cert: params.tls_cert_file.clone(),
                key: params.tls_key_file.clone(),
                source,
            })?;

        let handle = Handle::new();
        let shutdown = self.shutdown.clone();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            info!("Shutdown requested, draining connections");
            shutdown_handle.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
        });

        info!(
            addr = %params.addr,
            control_plane_id = %config.control_plane_id,
            "Agent proxy listening"
        );

        axum_server::bind_rustls(params.addr, tls_config)
            .handle(handle)
            .serve(router(config).into_make_service())
            .await
            .map_err(|e| {
                error!(error = %e, "Agent proxy stopped with an error");
                ProxyError::Server(e)
            })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadyzResponse {
    control_plane_id: String,
    cluster_id: String,
}

/// Probe routes served by the agent
pub fn router(config: Arc<AgentConfig>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readyz))
        .layer(TraceLayer::new_for_http())
        .with_state(config)
}

async fn readyz(State(config): State<Arc<AgentConfig>>) -> Json<ReadyzResponse> {
    Json(ReadyzResponse {
        control_plane_id: config.control_plane_id.to_string(),
        cluster_id: config.cluster_id.clone(),
    })
}
