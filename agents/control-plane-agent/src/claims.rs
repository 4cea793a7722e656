//! Control plane id extraction from the control plane token.
//!
//! The token is decoded WITHOUT verifying its signature. Its authenticity is
//! established by how it is provisioned into the pod, and the agent does not
//! hold the issuer's key at this point. Only the compact JWS structure and the
//! `sub` claim are checked here; the header's `alg` is never interpreted.

use agent_proxy::ControlPlaneId;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Prefix of the `sub` claim of control plane tokens
pub const PREFIX_PLATFORM_TOKEN_SUBJECT: &str = "controlPlane|";

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("malformed control plane token")]
    MalformedToken(#[source] TokenFormatError),

    #[error("failed to get value for key \"sub\"")]
    MissingSubjectClaim,

    #[error("failed to parse value for key \"sub\" as a string")]
    SubjectNotString,

    #[error("control plane id in token is not a valid UUID: {value}")]
    InvalidControlPlaneId {
        value: String,
        #[source]
        source: uuid::Error,
    },
}

/// Why a token could not be decoded as a compact JWS.
#[derive(Debug, Error)]
pub enum TokenFormatError {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("{segment} is not base64url")]
    Base64 {
        segment: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("{segment} is not a JSON object")]
    Json {
        segment: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads the control plane id from the `sub` claim of `token`.
pub fn read_control_plane_id(token: &str) -> Result<ControlPlaneId, ClaimError> {
    let claims = decode_claims(token.trim()).map_err(ClaimError::MalformedToken)?;

    let subject = match claims.get("sub") {
        None => return Err(ClaimError::MissingSubjectClaim),
        Some(Value::String(s)) => s,
        Some(_) => return Err(ClaimError::SubjectNotString),
    };

    let id = subject
        .strip_prefix(PREFIX_PLATFORM_TOKEN_SUBJECT)
        .unwrap_or(subject);

    Uuid::parse_str(id)
        .map(ControlPlaneId::new)
        .map_err(|source| ClaimError::InvalidControlPlaneId {
            value: id.to_string(),
            source,
        })
}

/// Decodes the header and payload of a compact JWS and returns the payload.
///
/// The header must be a JSON object but its contents are not inspected. The
/// signature segment is not decoded.
fn decode_claims(token: &str) -> Result<Map<String, Value>, TokenFormatError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, _signature] = segments.as_slice() else {
        return Err(TokenFormatError::SegmentCount(segments.len()));
    };

    decode_segment::<Map<String, Value>>("header", header)?;
    decode_segment("payload", payload)
}

fn decode_segment<T: serde::de::DeserializeOwned>(
    segment: &'static str,
    encoded: &str,
) -> Result<T, TokenFormatError> {
    // Issuers disagree on padding, so accept both forms
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|source| TokenFormatError::Base64 { segment, source })?;
    serde_json::from_slice(&bytes).map_err(|source| TokenFormatError::Json { segment, source })
}
