//! Cluster identity.
//!
//! The UID of the `kube-system` namespace is stable for the lifetime of a
//! cluster and unique across clusters, so it serves as the cluster id.

use k8s_openapi::api::core::v1::Namespace;
use kube::Api;
use thiserror::Error;
use tracing::debug;

const KUBE_SYSTEM_NAMESPACE: &str = "kube-system";

#[derive(Debug, Error)]
pub enum ClusterIdentityError {
    #[error("failed to get kube-system namespace")]
    GetKubeSystemNamespace(#[source] kube::Error),

    #[error("metadata.uid of kube-system namespace is empty")]
    EmptyUid,
}

/// Read access to namespaces, the only cluster API call bootstrap makes.
#[async_trait::async_trait]
pub trait NamespaceReader: Send + Sync {
    async fn get_namespace(&self, name: &str) -> Result<Namespace, kube::Error>;
}

#[async_trait::async_trait]
impl NamespaceReader for Api<Namespace> {
    async fn get_namespace(&self, name: &str) -> Result<Namespace, kube::Error> {
        self.get(name).await
    }
}

/// Returns the UID of the `kube-system` namespace.
pub async fn read_kube_cluster_id(
    namespaces: &dyn NamespaceReader,
) -> Result<String, ClusterIdentityError> {
    let ns = namespaces
        .get_namespace(KUBE_SYSTEM_NAMESPACE)
        .await
        .map_err(ClusterIdentityError::GetKubeSystemNamespace)?;

    match ns.metadata.uid {
        Some(uid) if !uid.is_empty() => {
            debug!(cluster_id = %uid, "Resolved cluster identity");
            Ok(uid)
        }
        _ => Err(ClusterIdentityError::EmptyUid),
    }
}
