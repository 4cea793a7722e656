//! Trust material for connections the agent makes to internal services.
//!
//! The agent talks to xgql inside the cluster over TLS. When a CA bundle is
//! configured for it, the bundle is turned into a [`TrustedCertPool`] once at
//! startup and shared for the lifetime of the process. Without a bundle no
//! pool exists and callers fall back to the platform roots.

use crate::error::TlsError;
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::CertificateDer;
use rustls::pki_types::pem::PemObject;
use rustls::{ClientConfig, RootCertStore};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Installs ring as the process-wide rustls provider.
///
/// Safe to call more than once; later calls are no-ops.
pub fn install_crypto_provider() {
    // Err only means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()))
}

/// A non-empty set of root certificates.
#[derive(Clone)]
pub struct TrustedCertPool {
    roots: Arc<RootCertStore>,
}

impl TrustedCertPool {
    /// Number of root certificates in the pool (always at least one)
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Always false; an empty bundle never produces a pool
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The underlying rustls root store
    pub fn roots(&self) -> Arc<RootCertStore> {
        Arc::clone(&self.roots)
    }

    /// Builds a WebPKI verifier that accepts only chains ending in this pool.
    pub fn server_verifier(&self) -> Result<Arc<WebPkiServerVerifier>, TlsError> {
        Ok(WebPkiServerVerifier::builder_with_provider(self.roots(), crypto_provider()).build()?)
    }

    /// Builds a client config trusting only this pool, without client auth.
    pub fn client_config(&self) -> Result<ClientConfig, TlsError> {
        Ok(ClientConfig::builder_with_provider(crypto_provider())
            .with_safe_default_protocol_versions()?
            .with_root_certificates(self.roots())
            .with_no_client_auth())
    }
}

impl fmt::Debug for TrustedCertPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedCertPool")
            .field("certificates", &self.roots.len())
            .finish()
    }
}

/// Builds a trust pool from a PEM bundle.
///
/// Every `CERTIFICATE` block is appended. Other PEM sections and blocks that
/// fail to decode are skipped. Fails when nothing could be appended, which
/// also covers empty and garbage input.
pub fn generate_trusted_cert_pool(pem: &[u8]) -> Result<TrustedCertPool, TlsError> {
    let certs: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(pem)
        .filter_map(Result::ok)
        .collect();

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);
    debug!(added, ignored, "Parsed CA bundle");

    if added == 0 {
        return Err(TlsError::NoCertificatesAppended);
    }

    Ok(TrustedCertPool {
        roots: Arc::new(roots),
    })
}
