//! HTTPS client construction with mutual-TLS support.
//!
//! This module provides `ClientBuilder`, a fluent interface for turning an
//! `EndpointConfig` plus a loaded `ClientIdentity` into a ready-to-use
//! blocking HTTP agent. It hides the rustls plumbing: root store
//! assembly according to the configured trust policy, client-auth wiring,
//! and agent timeouts.
//!
//! # Examples
//!
//! ## From configuration
//!
//! ```ignore
//! let identity = ClientIdentity::load(Path::new(&cfg.identity.container_path),
//!                                     &cfg.identity.passphrase)?;
//! let agent = ClientBuilder::from_config(&cfg)?.build(identity)?;
//! ```
//!
//! ## Programmatic, with a private trust root
//!
//! ```ignore
//! let agent = ClientBuilder::new()
//!     .with_trust_root("/etc/thermopost/root.pem")
//!     .connect_timeout(Duration::from_secs(10))
//!     .build(identity)?;
//! ```

use std::{fs::File, io::BufReader, sync::Arc, time::Duration};

use tracing::debug;
use validator::Validate;

use super::{config::EndpointConfig, error::TransportError, identity::ClientIdentity};

/// Builder for a mutually-authenticated HTTPS agent.
///
/// The builder is consumed by `build()`, which loads the trust store,
/// attaches the client identity and returns a `ureq::Agent`. The agent is
/// cheap to clone and reuses pooled connections across requests, which is
/// what makes the keep-alive hint effective.
pub struct ClientBuilder {
    /// Optional PEM file providing the root(s) of trust. None means the
    /// bundled Mozilla root set.
    trust_root: Option<String>,

    /// TCP/TLS connect timeout.
    connect_timeout: Duration,

    /// Overall per-exchange timeout.
    request_timeout: Duration,
}

impl ClientBuilder {
    /// Creates a builder with default timeouts and the bundled trust
    /// roots.
    pub fn new() -> Self {
        Self {
            trust_root: None,
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Creates a builder from a validated endpoint configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Config` when validation fails; the error
    /// names the offending field and constraint.
    pub fn from_config(config: &EndpointConfig) -> Result<Self, TransportError> {
        config.validate()?;

        Ok(Self {
            trust_root: config.ca_cert_path.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout),
            request_timeout: Duration::from_secs(config.request_timeout),
        })
    }

    /// Uses the given PEM file as the only root(s) of trust for server
    /// certificate verification.
    pub fn with_trust_root(mut self, path: impl Into<String>) -> Self {
        self.trust_root = Some(path.into());
        self
    }

    /// Sets the TCP/TLS connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the overall timeout for one request/response exchange.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Assembles the root certificate store per the trust policy.
    fn build_root_store(&self) -> Result<rustls::RootCertStore, TransportError> {
        let mut roots = rustls::RootCertStore::empty();

        match &self.trust_root {
            Some(path) => {
                let file = File::open(path)?;
                let mut reader = BufReader::new(file);
                let mut added = 0usize;
                for cert in rustls_pemfile::certs(&mut reader) {
                    roots.add(cert?)?;
                    added += 1;
                }
                if added == 0 {
                    return Err(TransportError::ClientSetup(format!(
                        "No certificates found in trust root {path}"
                    )));
                }
                debug!("Loaded {} trust root certificate(s) from {}", added, path);
            }
            None => {
                roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                debug!("Using bundled trust roots");
            }
        }

        Ok(roots)
    }

    /// Consumes the builder and the identity, producing the agent.
    ///
    /// # Errors
    ///
    /// - `TransportError::Io` / `ClientSetup`: trust root unreadable or
    ///   empty.
    /// - `TransportError::Tls`: the identity's key or chain was rejected
    ///   by the TLS stack.
    pub fn build(self, identity: ClientIdentity) -> Result<ureq::Agent, TransportError> {
        let roots = self.build_root_store()?;
        let (cert_chain, key) = identity.into_parts();

        let tls = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_client_auth_cert(cert_chain, key)?;

        Ok(ureq::AgentBuilder::new()
            .tls_config(Arc::new(tls))
            .timeout_connect(self.connect_timeout)
            .timeout(self.request_timeout)
            .build())
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
