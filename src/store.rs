/// Read access to the climate store.
///
/// `ClimateStore` is the seam between the handlers and PostgreSQL: the
/// handlers only ever see these operations, which keeps them testable
/// against an in-memory store. `PgStore` is the production implementation,
/// running every query inside one read-only transaction per request.

use crate::db;
use crate::error::ApiError;
use crate::model::{TemperatureAggregates, TemperatureObservation};
use crate::query::{Aggregate, Column, Direction, Expr, Op, Query, Relation};
use postgres::types::ToSql;
use postgres::{Client, Row, Transaction};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Read operations the API needs from the store.
pub trait ClimateStore {
    /// Greatest `measurement.date`, or `None` when there are no measurements.
    fn latest_date(&mut self) -> Result<Option<String>, ApiError>;

    /// `(date, prcp)` for every measurement with `date >= since`, in
    /// insertion order.
    fn precipitation_since(&mut self, since: &str) -> Result<Vec<(String, Option<f64>)>, ApiError>;

    /// Every `station.station` value, in store order.
    fn station_ids(&mut self) -> Result<Vec<String>, ApiError>;

    /// Station with the most measurement rows. Ties go to the lowest id.
    fn most_active_station(&mut self) -> Result<Option<String>, ApiError>;

    /// Observations for one station with `date >= since`, in insertion order.
    fn temperature_observations(
        &mut self,
        station: &str,
        since: &str,
    ) -> Result<Vec<TemperatureObservation>, ApiError>;

    /// Min/avg/max of `tobs` over `start <= date [<= end]`.
    fn temperature_summary(
        &mut self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureAggregates, ApiError>;
}

/// Hands out a store scoped to a single request.
///
/// Implementations open whatever the store needs (a connection, a
/// transaction), run `f`, and release it before returning, so no state
/// survives from one request to the next.
pub trait StoreProvider: Send + Sync {
    fn with_store<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut dyn ClimateStore) -> Result<T, ApiError>;
}

// ---------------------------------------------------------------------------
// Query definitions
// ---------------------------------------------------------------------------

pub fn latest_date_query() -> Query {
    Query::table(Relation::Measurement).aggregate(Aggregate::Max, Column::Date)
}

pub fn precipitation_query(since: &str) -> Query {
    Query::table(Relation::Measurement)
        .select(Column::Date)
        .select(Column::Prcp)
        .filter(Column::Date, Op::Ge, since)
        .order_by(Column::MeasurementId, Direction::Asc)
}

pub fn station_ids_query() -> Query {
    Query::table(Relation::Station).select(Column::StationId)
}

pub fn most_active_station_query() -> Query {
    Query::table(Relation::Measurement)
        .select(Column::MeasurementStation)
        .group_by(Column::MeasurementStation)
        .order_by(
            Expr::Aggregate(Aggregate::Count, Column::MeasurementStation),
            Direction::Desc,
        )
        .order_by(Column::MeasurementStation, Direction::Asc)
        .limit(1)
}

pub fn temperature_observations_query(station: &str, since: &str) -> Query {
    Query::table(Relation::Measurement)
        .select(Column::Date)
        .select(Column::Tobs)
        .filter(Column::MeasurementStation, Op::Eq, station)
        .filter(Column::Date, Op::Ge, since)
        .order_by(Column::MeasurementId, Direction::Asc)
}

pub fn temperature_summary_query(start: &str, end: Option<&str>) -> Query {
    let query = Query::table(Relation::Measurement)
        .aggregate(Aggregate::Min, Column::Tobs)
        .aggregate(Aggregate::Avg, Column::Tobs)
        .aggregate(Aggregate::Max, Column::Tobs)
        .filter(Column::Date, Op::Ge, start);

    match end {
        Some(end) => query.filter(Column::Date, Op::Le, end),
        None => query,
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// Climate store backed by a read-only PostgreSQL transaction.
pub struct PgStore<'a> {
    tx: Transaction<'a>,
}

impl<'a> PgStore<'a> {
    /// Start a read-only transaction on the given connection.
    pub fn begin(client: &'a mut Client) -> Result<Self, ApiError> {
        let tx = client.build_transaction().read_only(true).start()?;
        Ok(Self { tx })
    }

    /// Commit the (read-only) transaction. Dropping the store rolls it back
    /// instead, which is equally harmless.
    pub fn finish(self) -> Result<(), ApiError> {
        self.tx.commit()?;
        Ok(())
    }

    fn run(&mut self, query: &Query) -> Result<Vec<Row>, ApiError> {
        let (sql, params) = query.to_sql();
        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        tracing::trace!(%sql, ?params, "running query");
        Ok(self.tx.query(sql.as_str(), &bound)?)
    }
}

impl ClimateStore for PgStore<'_> {
    fn latest_date(&mut self) -> Result<Option<String>, ApiError> {
        let rows = self.run(&latest_date_query())?;
        Ok(rows.first().and_then(|row| row.get::<_, Option<String>>(0)))
    }

    fn precipitation_since(&mut self, since: &str) -> Result<Vec<(String, Option<f64>)>, ApiError> {
        let rows = self.run(&precipitation_query(since))?;
        Ok(rows.iter().map(|row| (row.get(0), row.get(1))).collect())
    }

    fn station_ids(&mut self) -> Result<Vec<String>, ApiError> {
        let rows = self.run(&station_ids_query())?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    fn most_active_station(&mut self) -> Result<Option<String>, ApiError> {
        let rows = self.run(&most_active_station_query())?;
        Ok(rows.first().map(|row| row.get(0)))
    }

    fn temperature_observations(
        &mut self,
        station: &str,
        since: &str,
    ) -> Result<Vec<TemperatureObservation>, ApiError> {
        let rows = self.run(&temperature_observations_query(station, since))?;
        Ok(rows
            .iter()
            .map(|row| TemperatureObservation {
                date: row.get(0),
                temperature: row.get(1),
            })
            .collect())
    }

    fn temperature_summary(
        &mut self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureAggregates, ApiError> {
        let rows = self.run(&temperature_summary_query(start, end))?;
        let Some(row) = rows.first() else {
            return Ok(TemperatureAggregates::default());
        };

        // AVG over an integer column comes back as NUMERIC
        let avg: Option<Decimal> = row.get(1);
        Ok(TemperatureAggregates {
            min: row.get(0),
            avg: avg.and_then(|d| d.to_f64()),
            max: row.get(2),
        })
    }
}

/// Opens a fresh PostgreSQL connection per request.
///
/// The connection is dropped, and so closed, when `with_store` returns.
#[derive(Debug, Clone)]
pub struct PgConnector {
    db_url: String,
}

impl PgConnector {
    pub fn new(db_url: impl Into<String>) -> Self {
        Self { db_url: db_url.into() }
    }
}

impl StoreProvider for PgConnector {
    fn with_store<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut dyn ClimateStore) -> Result<T, ApiError>,
    {
        let mut client = db::connect(&self.db_url)?;
        let mut store = PgStore::begin(&mut client)?;
        let out = f(&mut store)?;
        store.finish()?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precipitation_query_folds_in_insertion_order() {
        let (sql, params) = precipitation_query("2016-08-23").to_sql();
        assert_eq!(
            sql,
            "SELECT date, prcp FROM measurement WHERE date >= $1 ORDER BY id ASC"
        );
        assert_eq!(params, vec!["2016-08-23"]);
    }

    #[test]
    fn test_most_active_station_breaks_ties_by_lowest_id() {
        let (sql, params) = most_active_station_query().to_sql();
        assert!(sql.ends_with("ORDER BY COUNT(station) DESC, station ASC LIMIT 1"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_tobs_query_filters_station_then_window() {
        let (sql, params) = temperature_observations_query("USC00519281", "2016-08-23").to_sql();
        assert_eq!(
            sql,
            "SELECT date, tobs FROM measurement WHERE station = $1 AND date >= $2 \
             ORDER BY id ASC"
        );
        assert_eq!(params, vec!["USC00519281", "2016-08-23"]);
    }

    #[test]
    fn test_summary_query_single_and_bounded() {
        let (open, open_params) = temperature_summary_query("2017-01-01", None).to_sql();
        assert_eq!(
            open,
            "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement WHERE date >= $1"
        );
        assert_eq!(open_params.len(), 1);

        let (bounded, bounded_params) =
            temperature_summary_query("2017-01-01", Some("2017-01-31")).to_sql();
        assert!(bounded.ends_with("WHERE date >= $1 AND date <= $2"));
        assert_eq!(bounded_params, vec!["2017-01-01", "2017-01-31"]);
    }

    #[test]
    fn test_station_ids_query_has_no_ordering() {
        let (sql, _) = station_ids_query().to_sql();
        assert_eq!(sql, "SELECT station FROM station");
    }
}
