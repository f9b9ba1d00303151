//! Client library for the BroadWorks OCI-P provisioning protocol.
//!
//! OCI-P exchanges typed XML commands over a long-lived TCP connection
//! (optionally TLS) or inside SOAP envelopes over HTTP. This crate carries
//! the wire codec, the four transports, the session handshake, and the
//! dispatchers; the entity model lives in [`ocip_types`] and is re-exported
//! as [`types`].
//!
//! ```no_run
//! use ocip::{Client, ClientConfig};
//! use ocip::types::commands::UserGetRegistrationListRequest;
//!
//! # fn main() -> Result<(), ocip::OcipError> {
//! let config = ClientConfig::new("oci.example.com");
//! let mut client = Client::connect(config, "admin", "secret")?;
//!
//! let request = UserGetRegistrationListRequest {
//!     user_id: Some("user@example.com".into()),
//! };
//! let outcome = client.command(&request)?;
//! # let _ = outcome;
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

#![deny(missing_debug_implementations)]

pub mod client;
pub mod codec;
pub mod error;
pub mod session;
pub mod transport;

/// This module is only available with the `tokio` feature.
#[cfg(feature = "tokio")]
pub mod tokio;

pub use ocip_types;
pub use ocip_types as types;

pub use client::{Client, ClientConfig, CommandOutcome, Connection};
pub use error::OcipError;
pub use session::{Session, SessionState};
#[cfg(feature = "tokio")]
pub use crate::tokio::AsyncClient;
