//! Error handling for the HTTPS transport.
//!
//! `TransportError` is the unified error type for everything that can go
//! wrong between "we have a payload" and "we have a response": client
//! construction, TLS setup, and the HTTP exchange itself. Credential
//! container problems have their own type (`CredentialError` in the
//! `identity` module) because they are fatal at startup, while everything
//! here is either a startup configuration problem or a per-cycle failure
//! the publish loop recovers from.

use thiserror::Error;

use super::identity::CredentialError;

/// The unified error type for HTTPS transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Client construction failed for a reason not covered by a more
    /// specific variant (empty trust root, malformed endpoint, etc.).
    ///
    /// This typically means the application won't start; catch at startup
    /// and fail fast.
    #[error("Client setup error: {0}")]
    ClientSetup(String),

    /// Endpoint configuration failed validation.
    ///
    /// The `EndpointConfig` struct carries validation rules (via the
    /// `validator` crate) for the URI, timeouts, and certificate paths.
    /// Fix the configuration file and restart.
    #[error("Configuration error: {0}")]
    Config(#[from] validator::ValidationErrors),

    /// Building the TLS client configuration failed.
    ///
    /// Usually an unusable key or certificate in the loaded identity, or
    /// a trust root the TLS stack refuses to accept.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The client identity could not be loaded from its container.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// The HTTP exchange failed below the response level.
    ///
    /// DNS resolution, connection refused, TLS handshake rejection and
    /// timeouts all land here. These are recoverable: the publish loop
    /// logs the cycle as failed and carries on at its fixed cadence.
    ///
    /// Boxed to keep the enum small; `ureq::Error` carries a full
    /// response on some variants.
    #[error("Exchange error: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// Local I/O failed, e.g. reading a trust-root file or draining a
    /// response body.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Boxing conversion for `ureq::Error`, so `?` keeps working at call
/// sites without spelling out the Box.
impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        TransportError::Http(Box::new(err))
    }
}
