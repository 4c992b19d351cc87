//! Classification of one publish cycle's result.
//!
//! The ingestion endpoint acknowledges a publish by including the literal
//! substring `"OK"` in the response body. Anything else, including a
//! response that never arrived, counts as a failed cycle. The status code
//! is carried along for logging but never decides the outcome.

use std::fmt;

use thermopost_https::WireResponse;

/// The literal substring the endpoint puts in the body of an accepted
/// publish.
pub const SUCCESS_MARKER: &str = "OK";

/// Transient outcome of one HTTP exchange. Logged exactly once per cycle,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A response arrived and its body carries the success marker.
    Delivered { status: u16, body: String },

    /// A response arrived without the success marker.
    Rejected { status: u16, body: String },

    /// The exchange failed below the response level (DNS, TLS handshake,
    /// connection refused, timeout).
    Failed { reason: String },
}

impl PublishOutcome {
    /// Classifies a completed exchange by its body content.
    pub fn classify(response: WireResponse) -> Self {
        if response.body.contains(SUCCESS_MARKER) {
            PublishOutcome::Delivered {
                status: response.status,
                body: response.body,
            }
        } else {
            PublishOutcome::Rejected {
                status: response.status,
                body: response.body,
            }
        }
    }

    /// Wraps a transport-level failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        PublishOutcome::Failed {
            reason: reason.into(),
        }
    }

    /// True only for `Delivered`.
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Delivered { .. })
    }

    /// Short static identifier for logging and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishOutcome::Delivered { .. } => "Delivered",
            PublishOutcome::Rejected { .. } => "Rejected",
            PublishOutcome::Failed { .. } => "Failed",
        }
    }
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Delivered { status, body } => {
                write!(f, "Delivered (status {status}): {body}")
            }
            PublishOutcome::Rejected { status, body } => {
                write!(f, "Rejected (status {status}): {body}")
            }
            PublishOutcome::Failed { reason } => write!(f, "Failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> WireResponse {
        WireResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn body_with_marker_is_delivered() {
        let outcome = PublishOutcome::classify(response(200, "{\"message\":\"OK\"}"));
        assert!(outcome.is_success());
        assert_eq!(outcome.as_str(), "Delivered");
    }

    #[test]
    fn marker_is_a_substring_match() {
        // The endpoint's acknowledgment format varies; any body carrying
        // the marker counts.
        assert!(PublishOutcome::classify(response(200, "OK")).is_success());
        assert!(PublishOutcome::classify(response(200, "status=OK;queued")).is_success());
    }

    #[test]
    fn body_without_marker_is_rejected() {
        let outcome = PublishOutcome::classify(response(403, "ERROR: bad cert"));
        assert!(!outcome.is_success());
        match outcome {
            PublishOutcome::Rejected { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "ERROR: bad cert");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn status_code_does_not_decide() {
        // A 2xx without the marker is still a rejection, and an error
        // status carrying the marker still counts as delivered.
        assert!(!PublishOutcome::classify(response(200, "queued")).is_success());
        assert!(PublishOutcome::classify(response(500, "OK (eventually)")).is_success());
    }

    #[test]
    fn transport_failure_is_failed() {
        let outcome = PublishOutcome::failed("connection refused");
        assert!(!outcome.is_success());
        assert_eq!(outcome.as_str(), "Failed");
        assert_eq!(outcome.to_string(), "Failed: connection refused");
    }

    #[test]
    fn display_carries_the_body() {
        let outcome = PublishOutcome::classify(response(200, "OK"));
        assert_eq!(outcome.to_string(), "Delivered (status 200): OK");
    }
}
