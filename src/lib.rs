//! thermopost — mutual-TLS telemetry publisher
//!
//! This crate provides a small, long-running agent that publishes a
//! simulated thermostat reading to an HTTPS ingestion endpoint at a fixed
//! cadence, authenticating with a client certificate on every TLS
//! handshake. Delivery is fire-and-forget: each cycle is independent,
//! failures are logged and the loop carries on.
//!
//! ## Modules
//!
//! * `config` — Configuration structures, loading, validation, and
//!   defaults. TOML configuration files validated via the `validator`
//!   crate.
//!
//! * `core` — Core runtime components:
//!   - Publish loop runner with injectable transport and stop signal
//!   - Measurement source abstraction and random generator
//!   - Outcome classification against the endpoint's success marker
//!   - Cycle state tracking
//!
//! * `logger` — Centralized logging initialization using `tracing`.
//!   Supports console output in multiple formats (compact, pretty, JSON)
//!   and optional systemd journald integration.
//!
//! The wire layer lives in the `thermopost-https` crate: client identity
//! loading from a PKCS#12 container, TLS client construction, and the
//! POST exchange itself.

pub mod config;
pub mod core;
pub mod logger;
