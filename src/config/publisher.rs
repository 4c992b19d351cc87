//! Configuration for the publish loop.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Timing configuration for the publish cycle.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PublisherConfig {
    /// Fixed delay between publish cycles, in milliseconds. Applied after
    /// every cycle regardless of outcome; there is no backoff growth and
    /// no failure cap.
    #[validate(range(min = 1, message = "Publish interval must be at least 1 ms"))]
    pub interval_ms: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        PublisherConfig { interval_ms: 5000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_five_seconds() {
        let config = PublisherConfig::default();
        assert_eq!(config.interval_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = PublisherConfig { interval_ms: 0 };
        assert!(config.validate().is_err());
    }
}
