/// Shared data types for the climate API.
///
/// Row types mirror the two relations of the climate store (`measurement`
/// and `station`). Response types are the exact JSON shapes served by the
/// endpoint; field renames match the keys clients already depend on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date format used by the `measurement.date` text column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Store rows
// ---------------------------------------------------------------------------

/// One daily observation from the `measurement` relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub station: String,
    /// `YYYY-MM-DD`, stored as text.
    pub date: String,
    pub prcp: Option<f64>,
    pub tobs: Option<i32>,
}

/// One row of the `station` relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Date → precipitation for the trailing-year window.
///
/// A sorted map: duplicate dates across stations collapse to the last value
/// folded in, and key order is stable between calls.
pub type PrecipitationResponse = BTreeMap<String, Option<f64>>;

/// Station ids in store order.
pub type StationsResponse = Vec<String>;

/// A single temperature observation of the most active station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureObservation {
    pub date: String,
    pub temperature: Option<i32>,
}

/// Min/avg/max temperature over a date range.
///
/// `End Date` is only present for the bounded form of the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSummary {
    #[serde(rename = "Start Date")]
    pub start_date: String,
    #[serde(rename = "End Date", skip_serializing_if = "Option::is_none", default)]
    pub end_date: Option<String>,
    #[serde(rename = "Min Temp")]
    pub min_temp: Option<i32>,
    #[serde(rename = "Avg Temp")]
    pub avg_temp: Option<f64>,
    #[serde(rename = "Max Temp")]
    pub max_temp: Option<i32>,
}

/// Raw aggregate triple as returned by the store, before the dates are attached.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemperatureAggregates {
    pub min: Option<i32>,
    pub avg: Option<f64>,
    pub max: Option<i32>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
