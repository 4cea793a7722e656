//! Test utilities for unit testing the bootstrap
//!
//! In-memory stand-ins for the cluster API and the proxy runtime, plus
//! helpers for building tokens and command line arguments.

use crate::cli::AgentArgs;
use crate::cluster::NamespaceReader;
use agent_proxy::{AgentConfig, ProxyError, ProxyRuntime, ServeParams};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Namespace reader that returns a namespace with a fixed UID
#[derive(Debug, Default)]
pub struct StaticNamespaces {
    uid: Option<String>,
    requested: Mutex<Vec<String>>,
}

impl StaticNamespaces {
    pub fn with_uid(uid: Option<&str>) -> Self {
        Self {
            uid: uid.map(str::to_string),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Names passed to `get_namespace`, in call order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NamespaceReader for StaticNamespaces {
    async fn get_namespace(&self, name: &str) -> Result<Namespace, kube::Error> {
        self.requested.lock().unwrap().push(name.to_string());
        Ok(Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                uid: self.uid.clone(),
                ..Default::default()
            },
            ..Default::default()
        })
    }
}

/// Namespace reader whose every call fails
#[derive(Debug, Default)]
pub struct FailingNamespaces;

#[async_trait::async_trait]
impl NamespaceReader for FailingNamespaces {
    async fn get_namespace(&self, _name: &str) -> Result<Namespace, kube::Error> {
        Err(kube::Error::Service("connection refused".into()))
    }
}

/// Proxy runtime that records what it was started with and returns at once
#[derive(Default)]
pub struct RecordingProxy {
    runs: Mutex<Vec<(Arc<AgentConfig>, ServeParams)>>,
    fail_next: AtomicBool,
}

impl RecordingProxy {
    pub fn runs(&self) -> Vec<(Arc<AgentConfig>, ServeParams)> {
        self.runs.lock().unwrap().clone()
    }

    pub fn fail_next_run(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ProxyRuntime for RecordingProxy {
    async fn run(&self, config: Arc<AgentConfig>, params: ServeParams) -> Result<(), ProxyError> {
        self.runs.lock().unwrap().push((config, params));
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ProxyError::Server(std::io::Error::other("address in use")));
        }
        Ok(())
    }
}

/// Builds a compact JWS carrying only `sub`, with a signature nobody issued
pub fn unsigned_token(subject: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::json!({ "sub": subject }).to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Agent arguments as the Deployment would pass them
pub fn test_agent_args(
    control_plane_token_path: PathBuf,
    xgql_ca_bundle_file: Option<PathBuf>,
) -> AgentArgs {
    AgentArgs {
        pod_name: "agent-0".to_string(),
        server_port: 6443,
        tls_cert_file: PathBuf::from("/tls/tls.crt"),
        tls_key_file: PathBuf::from("/tls/tls.key"),
        xgql_ca_bundle_file,
        nats_endpoint: "nats://nats:4222".to_string(),
        upbound_api_endpoint: "https://api.upbound.io".to_string(),
        control_plane_token_path,
    }
}
