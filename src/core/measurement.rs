//! Measurement generation for the publish loop.
//!
//! Each cycle publishes one simulated thermostat reading. The record's
//! wire field names are a fixed contract with the ingestion endpoint and
//! are pinned with serde renames; the Rust-side names stay idiomatic.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One simulated thermostat reading.
///
/// Exists only for the duration of a single publish cycle; nothing is
/// persisted. Serializes to
/// `{"thermostatID": .., "setPoint": .., "currentTemperature": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Device identifier, drawn from [0, 10000).
    #[serde(rename = "thermostatID")]
    pub thermostat_id: u32,

    /// Target temperature in degrees Fahrenheit, drawn from [32, 100).
    #[serde(rename = "setPoint")]
    pub set_point: u8,

    /// Observed temperature in degrees Fahrenheit, drawn from [32, 100).
    #[serde(rename = "currentTemperature")]
    pub current_temperature: u8,
}

/// A source of measurement records, one per publish cycle.
///
/// The runner takes this as a trait object so tests can feed
/// deterministic sequences instead of random readings.
pub trait MeasurementSource: Send {
    /// Produces the next reading.
    fn generate(&mut self) -> MeasurementRecord;
}

/// The production source: fresh random values in the documented ranges on
/// every call. Determinism is not required; bounds are.
#[derive(Debug, Default)]
pub struct RandomMeasurementSource;

impl RandomMeasurementSource {
    pub fn new() -> Self {
        RandomMeasurementSource
    }
}

impl MeasurementSource for RandomMeasurementSource {
    fn generate(&mut self) -> MeasurementRecord {
        let mut rng = rand::rng();
        MeasurementRecord {
            thermostat_id: rng.random_range(0..10_000),
            set_point: rng.random_range(32..100),
            current_temperature: rng.random_range(32..100),
        }
    }
}
