//! Agent proxy errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building trust material
#[derive(Debug, Error)]
pub enum TlsError {
    /// The PEM bundle contained no usable certificate
    #[error("no certs appended, ca cert should have been appended")]
    NoCertificatesAppended,

    /// rustls refused to build a verifier or client config from the pool
    #[error("TLS configuration error: {0}")]
    Config(#[from] rustls::Error),

    /// The pool could not be turned into a certificate verifier
    #[error("certificate verifier error: {0}")]
    Verifier(#[from] rustls::client::VerifierBuilderError),
}

/// Errors that can occur while the proxy runtime is serving
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The serving certificate or key could not be loaded
    #[error("failed to load TLS key pair from {cert} and {key}: {source}")]
    TlsKeyPair {
        cert: PathBuf,
        key: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The listener failed to bind or the server stopped with an error
    #[error("server failed: {0}")]
    Server(#[from] std::io::Error),
}
