//! Configuration structures for the HTTPS transport.
//!
//! Everything the transport needs to reach the ingestion endpoint lives
//! here: the endpoint URI, timeouts, the connection persistence hint, the
//! root-of-trust policy, and the location of the client identity
//! container. All structures deserialize with serde (TOML in production)
//! and carry validation rules enforced by the `validator` crate, so a
//! broken configuration fails at load time rather than at the first
//! publish.
//!
//! # Trust policy
//!
//! Server certificate verification is configurable:
//! - `ca_cert_path` set: the trust store contains exactly the PEM
//!   certificates in that file. This is the private-CA deployment shape,
//!   where the endpoint's certificate chains to an in-house root.
//! - `ca_cert_path` unset: the bundled Mozilla root set (`webpki-roots`)
//!   is used, for endpoints with publicly trusted certificates.
//!
//! The client identity is presented through the TLS client-auth lane in
//! both cases; a CA certificate is never sent as a client certificate.

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Endpoint and TLS configuration for the HTTPS transport.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EndpointConfig {
    /// Full URI of the ingestion endpoint, including any topic query
    /// parameter, e.g.
    /// `https://data.iot.example.com:8443/topics/thermostat?qos=1`.
    ///
    /// Must use the `https` scheme; the transport always authenticates
    /// the server and presents the client identity.
    #[validate(
        length(min = 1, max = 2048, message = "Endpoint URI must be between 1 and 2048 characters"),
        custom(function = "validate_https_uri")
    )]
    pub endpoint: String,

    /// TCP/TLS connect timeout in seconds.
    #[validate(range(
        min = 1,
        max = 300,
        message = "Connect timeout must be between 1 and 300 seconds"
    ))]
    pub connect_timeout: u64,

    /// Overall timeout for one request/response exchange, in seconds.
    #[validate(range(
        min = 1,
        max = 600,
        message = "Request timeout must be between 1 and 600 seconds"
    ))]
    pub request_timeout: u64,

    /// Whether to ask the endpoint to keep the connection open between
    /// publishes. A performance hint, not a correctness requirement; the
    /// exchange works either way.
    pub keep_alive: bool,

    /// Optional PEM file with the root certificate(s) used to verify the
    /// endpoint. When unset, the bundled Mozilla roots are used instead.
    #[validate(custom(
        function = "validate_optional_file_exists",
        message = "Trust root file does not exist"
    ))]
    pub ca_cert_path: Option<String>,

    /// Location and passphrase of the client identity container.
    #[validate(nested)]
    pub identity: IdentityConfig,
}

impl Default for EndpointConfig {
    /// Defaults suitable for development against a local endpoint. The
    /// identity container path is intentionally empty: there is no safe
    /// default for credentials, so an unconfigured transport fails
    /// validation instead of half-working.
    fn default() -> Self {
        EndpointConfig {
            endpoint: "https://localhost:8443/topics/thermostat?qos=1".to_string(),
            connect_timeout: 30,
            request_timeout: 30,
            keep_alive: true,
            ca_cert_path: None,
            identity: IdentityConfig::default(),
        }
    }
}

/// Location of the password-protected PKCS#12 client identity container.
///
/// The passphrase is configuration data, not a literal in code. Keep the
/// config file readable only by the service user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IdentityConfig {
    /// Path of the PKCS#12 (.pfx/.p12) container file.
    #[validate(length(min = 1, message = "Identity container path must not be empty"))]
    pub container_path: String,

    /// Passphrase protecting the container. May be empty if the container
    /// was created without one.
    pub passphrase: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            container_path: String::new(),
            passphrase: String::new(),
        }
    }
}

/// Validates that the endpoint URI uses the https scheme.
fn validate_https_uri(endpoint: &str) -> Result<(), ValidationError> {
    if endpoint.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::new("not_https")
            .with_message("Endpoint URI must use the https scheme".into()))
    }
}

/// Validates that an optional file path exists and points at a file.
fn validate_optional_file_exists(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(
            ValidationError::new("empty_path").with_message("File path cannot be empty".into())
        );
    }

    let path_obj = Path::new(path);
    if !path_obj.exists() {
        return Err(ValidationError::new("file_not_found")
            .with_message(format!("File does not exist: {path}").into()));
    }
    if !path_obj.is_file() {
        return Err(ValidationError::new("not_a_file")
            .with_message(format!("Path is not a file: {path}").into()));
    }

    Ok(())
}
