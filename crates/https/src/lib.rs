//! # thermopost-https: mutual-TLS HTTPS transport
//!
//! The wire layer of the thermopost publisher. This crate turns a
//! password-protected PKCS#12 client identity and an endpoint
//! configuration into a single blocking operation: post a payload, get
//! back the full response or a transport error.
//!
//! - **Identity loading** (`identity`): PKCS#12 parsing, passphrase
//!   verification, certificate/key extraction. Failures are startup-fatal.
//! - **Client construction** (`client`): rustls client configuration with
//!   client auth and a configurable root-of-trust policy, wrapped in a
//!   pooling `ureq` agent.
//! - **The exchange** (`transport`): POST with the endpoint's fixed header
//!   contract; error statuses are still responses, only connection-level
//!   failures are errors.
//! - **Configuration** (`config`): serde + validator structures, loadable
//!   from TOML.
//!
//! # Quick start
//!
//! ```ignore
//! use thermopost_https::{ClientIdentity, EndpointConfig, HttpsTransport};
//!
//! let config: EndpointConfig = toml::from_str(&config_text)?;
//! let identity = ClientIdentity::load(
//!     Path::new(&config.identity.container_path),
//!     &config.identity.passphrase,
//! )?;
//! let transport = HttpsTransport::new(identity, &config)?;
//!
//! let response = transport.send_blocking(br#"{"thermostatID":7}"#)?;
//! println!("{}: {}", response.status, response.body);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod transport;

// Re-exports: the types applications actually touch.
pub use client::ClientBuilder;
pub use config::{EndpointConfig, IdentityConfig};
pub use error::TransportError;
pub use identity::{ClientIdentity, CredentialError};
pub use transport::{HttpsTransport, WireResponse};

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
