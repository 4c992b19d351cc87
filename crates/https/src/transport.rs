//! The publish exchange: one authenticated HTTPS POST per call.
//!
//! `HttpsTransport` owns the agent built by `ClientBuilder` and knows the
//! endpoint's wire expectations. Its single operation takes a serialized
//! payload and blocks until a full response (status + body) has been read
//! or the connection fails. Classification of the response body happens
//! upstream; this layer only distinguishes "got a response" from "the
//! exchange failed below the response level".

use tracing::trace;

use super::{
    client::ClientBuilder, config::EndpointConfig, error::TransportError,
    identity::ClientIdentity,
};

/// A completed HTTP exchange as the transport sees it.
///
/// A non-2xx status with a readable body still counts as a response: the
/// endpoint signals acceptance through the body text, so the status class
/// alone decides nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, decoded as UTF-8 text.
    pub body: String,
}

/// Blocking HTTPS transport bound to one endpoint.
///
/// Cheap to clone: the inner agent shares its connection pool and TLS
/// configuration, so clones keep benefiting from kept-alive connections.
#[derive(Clone)]
pub struct HttpsTransport {
    agent: ureq::Agent,
    endpoint: String,
    keep_alive: bool,
}

impl HttpsTransport {
    /// Builds the transport from configuration and a loaded identity.
    ///
    /// Consumes the identity; it lives on inside the agent's TLS
    /// configuration and is presented on every handshake.
    ///
    /// # Errors
    ///
    /// Propagates configuration validation and TLS setup failures. These
    /// are startup errors; once `new` succeeds, only per-exchange errors
    /// remain.
    pub fn new(identity: ClientIdentity, config: &EndpointConfig) -> Result<Self, TransportError> {
        let agent = ClientBuilder::from_config(config)?.build(identity)?;

        Ok(Self {
            agent,
            endpoint: config.endpoint.clone(),
            keep_alive: config.keep_alive,
        })
    }

    /// The endpoint URI this transport posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts one payload and blocks until the response is fully read.
    ///
    /// Request shape, fixed by the endpoint's contract:
    /// - method POST
    /// - `Content-Type: application/x-www-form-urlencoded`, even though
    ///   the body is JSON text; the endpoint expects exactly this header
    ///   and changing it breaks ingestion
    /// - `Content-Length` set explicitly to the payload byte length
    /// - `Connection: keep-alive` (or `close`) per configuration
    ///
    /// # Errors
    ///
    /// Only exchange-level failures (DNS, refused connection, TLS
    /// rejection, timeout) surface as `TransportError`. Responses with
    /// error statuses are folded into `Ok(WireResponse)` with their body
    /// intact.
    pub fn send_blocking(&self, payload: &[u8]) -> Result<WireResponse, TransportError> {
        trace!("POST {} ({} bytes)", self.endpoint, payload.len());

        let request = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/x-www-form-urlencoded")
            .set("Content-Length", &payload.len().to_string())
            .set(
                "Connection",
                if self.keep_alive { "keep-alive" } else { "close" },
            );

        match request.send_bytes(payload) {
            Ok(response) => Self::read_response(response),
            // ureq reports 4xx/5xx as errors carrying the response; the
            // body still decides the cycle's outcome, so fold them back.
            Err(ureq::Error::Status(_, response)) => Self::read_response(response),
            Err(err) => Err(err.into()),
        }
    }

    /// Drains a response into a `WireResponse`, releasing the underlying
    /// stream back to the pool.
    fn read_response(response: ureq::Response) -> Result<WireResponse, TransportError> {
        let status = response.status();
        let body = response.into_string()?;
        trace!("Response status {} ({} bytes)", status, body.len());

        Ok(WireResponse { status, body })
    }
}
