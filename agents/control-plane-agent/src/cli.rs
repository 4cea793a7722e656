//! Command line interface.
//!
//! Every flag can also be set through the environment variable named next to
//! it, which is how the agent's Deployment configures it.

use agent_proxy::ServeParams;
use clap::{Args, Parser, Subcommand};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Control plane agent
#[derive(Parser, Debug)]
#[command(name = "control-plane-agent", version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode
    #[arg(long, global = true, env = "AGENT_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the agent
    Agent(AgentArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AgentArgs {
    /// Name of the agent pod
    #[arg(long, env = "POD_NAME")]
    pub pod_name: String,

    /// Port to serve agent service
    #[arg(long, env = "SERVER_PORT", default_value_t = 6443)]
    pub server_port: u16,

    /// File containing the default x509 certificate for HTTPS
    #[arg(long, env = "TLS_CERT_FILE")]
    pub tls_cert_file: PathBuf,

    /// File containing the default x509 private key matching the certificate
    #[arg(long, env = "TLS_KEY_FILE")]
    pub tls_key_file: PathBuf,

    /// CA bundle file for the xgql server
    #[arg(long, env = "XGQL_CA_BUNDLE_FILE")]
    pub xgql_ca_bundle_file: Option<PathBuf>,

    /// Endpoint for NATS
    #[arg(long, env = "NATS_ENDPOINT")]
    pub nats_endpoint: String,

    /// Endpoint for the Upbound API
    #[arg(long, env = "UPBOUND_API_ENDPOINT")]
    pub upbound_api_endpoint: String,

    /// File path of the control plane token used to access the connect endpoint
    #[arg(long, env = "CONTROL_PLANE_TOKEN_PATH")]
    pub control_plane_token_path: PathBuf,
}

impl AgentArgs {
    /// Serving parameters for the proxy: all interfaces on `server_port`
    pub fn serve_params(&self) -> ServeParams {
        ServeParams {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.server_port)),
            tls_cert_file: self.tls_cert_file.clone(),
            tls_key_file: self.tls_key_file.clone(),
        }
    }
}
