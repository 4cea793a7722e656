//! Control plane client errors

use thiserror::Error;

/// Errors that can occur when talking to the control plane API
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an unexpected status or body
    #[error("control plane API error: {0}")]
    Api(String),

    /// The control plane token was rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}
