//! In-memory climate store shared by the integration tests.
//!
//! Mirrors the semantics of the PostgreSQL queries: text comparison on
//! dates, insertion (vector) order standing in for `ORDER BY id`, lowest-id tie-break
//! for the most active station, SQL-style null handling in aggregates.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use surfsup::db::DbConfigError;
use surfsup::error::ApiError;
use surfsup::model::{Measurement, Station, TemperatureAggregates, TemperatureObservation};
use surfsup::store::{ClimateStore, StoreProvider};

pub const BUSIEST: &str = "USC00519281";
pub const QUIET: &str = "USC00513117";
pub const RETIRED: &str = "USC00518838";

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub measurements: Vec<Measurement>,
    pub stations: Vec<Station>,
}

impl ClimateStore for MemoryStore {
    fn latest_date(&mut self) -> Result<Option<String>, ApiError> {
        Ok(self.measurements.iter().map(|m| m.date.clone()).max())
    }

    fn precipitation_since(&mut self, since: &str) -> Result<Vec<(String, Option<f64>)>, ApiError> {
        Ok(self
            .measurements
            .iter()
            .filter(|m| m.date.as_str() >= since)
            .map(|m| (m.date.clone(), m.prcp))
            .collect())
    }

    fn station_ids(&mut self) -> Result<Vec<String>, ApiError> {
        Ok(self.stations.iter().map(|s| s.station.clone()).collect())
    }

    fn most_active_station(&mut self) -> Result<Option<String>, ApiError> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for m in &self.measurements {
            *counts.entry(m.station.as_str()).or_default() += 1;
        }

        let mut best: Option<(&str, usize)> = None;
        for (station, count) in counts {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((station, count));
            }
        }
        Ok(best.map(|(station, _)| station.to_string()))
    }

    fn temperature_observations(
        &mut self,
        station: &str,
        since: &str,
    ) -> Result<Vec<TemperatureObservation>, ApiError> {
        Ok(self
            .measurements
            .iter()
            .filter(|m| m.station == station && m.date.as_str() >= since)
            .map(|m| TemperatureObservation {
                date: m.date.clone(),
                temperature: m.tobs,
            })
            .collect())
    }

    fn temperature_summary(
        &mut self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureAggregates, ApiError> {
        let values: Vec<i32> = self
            .measurements
            .iter()
            .filter(|m| m.date.as_str() >= start && end.is_none_or(|e| m.date.as_str() <= e))
            .filter_map(|m| m.tobs)
            .collect();

        if values.is_empty() {
            return Ok(TemperatureAggregates::default());
        }

        let sum: i64 = values.iter().map(|&v| v as i64).sum();
        Ok(TemperatureAggregates {
            min: values.iter().min().copied(),
            avg: Some(sum as f64 / values.len() as f64),
            max: values.iter().max().copied(),
        })
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Hands each request its own copy of the store and counts how many were opened.
pub struct MemoryProvider {
    pub store: MemoryStore,
    pub opened: AtomicUsize,
}

impl MemoryProvider {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            opened: AtomicUsize::new(0),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl StoreProvider for MemoryProvider {
    fn with_store<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut dyn ClimateStore) -> Result<T, ApiError>,
    {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let mut store = self.store.clone();
        f(&mut store)
    }
}

/// Every connection attempt fails.
pub struct UnreachableProvider;

impl StoreProvider for UnreachableProvider {
    fn with_store<T, F>(&self, _f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut dyn ClimateStore) -> Result<T, ApiError>,
    {
        Err(ApiError::Connection(DbConfigError::InvalidDatabaseUrl(
            "unreachable://".to_string(),
        )))
    }
}

// ---------------------------------------------------------------------------
// Fixture data
// ---------------------------------------------------------------------------

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn station(id: &str, name: &str) -> Station {
    Station {
        station: id.to_string(),
        name: name.to_string(),
        latitude: 21.3,
        longitude: -157.8,
        elevation: 10.0,
    }
}

pub fn measurement(station: &str, date: &str, prcp: Option<f64>, tobs: Option<i32>) -> Measurement {
    Measurement {
        station: station.to_string(),
        date: date.to_string(),
        prcp,
        tobs,
    }
}

/// Deterministic temperature for day offset `i`.
pub fn temperature_for(i: i64) -> i32 {
    60 + (i % 23) as i32
}

/// Three stations:
/// - BUSIEST reports daily from 2016-01-01 to 2017-08-18
/// - QUIET reports every third day from 2016-01-01 to 2017-08-23 (the global max)
/// - RETIRED reports daily for the first half of 2010
pub fn hawaii_fixture() -> MemoryStore {
    let mut measurements = Vec::new();

    let mut push_range = |station: &str, from: &str, to: &str, step: i64| {
        let start = date(from);
        let end = date(to);
        let mut day = start;
        let mut i = 0;
        while day <= end {
            let prcp = if i % 7 == 0 { None } else { Some((i % 5) as f64 * 0.1) };
            let tobs = if i % 11 == 0 { None } else { Some(temperature_for(i)) };
            measurements.push(measurement(
                station,
                &day.format("%Y-%m-%d").to_string(),
                prcp,
                tobs,
            ));
            day += Duration::days(step);
            i += 1;
        }
    };

    push_range(BUSIEST, "2016-01-01", "2017-08-18", 1);
    push_range(QUIET, "2016-01-01", "2017-08-23", 3);
    push_range(RETIRED, "2010-01-01", "2010-06-30", 1);

    MemoryStore {
        measurements,
        stations: vec![
            station(QUIET, "KANEOHE 838.1, HI US"),
            station(BUSIEST, "WAIHEE 837.5, HI US"),
            station(RETIRED, "UPPER WAHIAWA 874.3, HI US"),
        ],
    }
}
