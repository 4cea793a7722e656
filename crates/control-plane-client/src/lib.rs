//! Control Plane API Client
//!
//! Client for the control plane API endpoints the agent needs at startup.
//!
//! # Example
//!
//! ```no_run
//! use control_plane_client::ControlPlaneClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ControlPlaneClient::new("https://api.upbound.io".to_string(), false)?;
//!
//! // Exchange the control plane token for the gateway's public key and NATS CA
//! let certs = client.get_gateway_certs("control-plane-token").await?;
//! println!("NATS CA is {} bytes", certs.nats_ca.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod control_plane_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::ControlPlaneClient;
pub use control_plane_trait::ControlPlaneClientTrait;
pub use error::ControlPlaneError;
pub use models::*;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockControlPlaneClient;
