//! Control Plane Agent
//!
//! Startup sequence of the agent running inside a managed control plane:
//! - Waits for the control plane token to be mounted into the pod
//! - Reads the control plane id from the token
//! - Fetches the gateway's token signing key and the NATS CA from the control plane API
//! - Builds the trust pool for the xgql server
//! - Reads the cluster id from the `kube-system` namespace
//!
//! Then hands the assembled configuration to the agent proxy.

mod bootstrap;
mod claims;
mod cli;
mod cluster;
mod credential;
mod error;
#[cfg(test)]
mod test_utils;

use agent_proxy::{Proxy, install_crypto_provider};
use anyhow::Context;
use bootstrap::Bootstrap;
use clap::Parser;
use cli::{AgentArgs, Cli, Commands};
use control_plane_client::ControlPlaneClient;
use k8s_openapi::api::core::v1::Namespace;
use kube::Api;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    install_crypto_provider();

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_shutdown_signals(shutdown.clone()));

    let result = match cli.command {
        Commands::Agent(args) => run_agent(args, cli.debug, &shutdown).await,
    };
    exit_status(result)
}

async fn run_agent(
    args: AgentArgs,
    debug: bool,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    let kube_client = kube::Client::try_default()
        .await
        .context("failed to create kube client from in-cluster config")?;
    let control_plane = ControlPlaneClient::new(args.upbound_api_endpoint.clone(), debug)
        .context("failed to create control plane client")?;

    let bootstrap = Bootstrap::new(
        args,
        debug,
        Arc::new(control_plane),
        Arc::new(Api::<Namespace>::all(kube_client)),
        Arc::new(Proxy::new(shutdown.clone())),
    );
    bootstrap.run(shutdown).await?;

    info!("Control plane agent stopped");
    Ok(())
}

/// Logs a failed run with its full error chain, once.
fn exit_status(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{e:#}"), "Control plane agent failed");
            ExitCode::FAILURE
        }
    }
}

/// Cancels `shutdown` on Ctrl-C or SIGTERM.
async fn watch_shutdown_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
