/// surfsup: read-only HTTP API over daily climate observations.
///
/// # Module structure
///
/// ```text
/// surfsup
/// ├── model     — row and response types (Measurement, Station, TemperatureSummary, …)
/// ├── config    — service configuration loader (surfsup.toml)
/// ├── db        — connection and table validation
/// ├── query     — minimal query builder over the two relations
/// ├── store     — ClimateStore seam, PostgreSQL implementation, per-request connector
/// ├── handlers  — precipitation, stations, tobs and date-range handlers
/// ├── endpoint  — routing and the tiny_http server loop
/// └── error     — ApiError and its HTTP status mapping
/// ```

/// Public modules
pub mod config;
pub mod db;
pub mod endpoint;
pub mod error;
pub mod handlers;
pub mod model;
pub mod query;
pub mod store;
