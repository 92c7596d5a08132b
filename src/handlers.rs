/// Request handlers for the climate API.
///
/// Each handler is a pure function of the store's contents and its path
/// parameters. None of them hold state between requests; the HTTP layer
/// hands each one a store scoped to the current request.

use crate::error::ApiError;
use crate::model::{
    DATE_FORMAT, PrecipitationResponse, StationsResponse, TemperatureObservation,
    TemperatureSummary,
};
use crate::store::ClimateStore;
use chrono::{Days, NaiveDate};

/// Route paths listed by the welcome page.
pub const ROUTES: &[&str] = &[
    "/api/v1.0/precipitation",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/<start>",
    "/api/v1.0/<start>/<end>",
];

/// Default length of the trailing-year window, in days.
pub const TRAILING_WINDOW_DAYS: i64 = 365;

/// Longest trailing window the service accepts (a century).
pub const MAX_TRAILING_WINDOW_DAYS: i64 = 36_500;

// ---------------------------------------------------------------------------
// Date window
// ---------------------------------------------------------------------------

/// First date of the trailing window ending at `recent_date`.
///
/// Calendar subtraction, so a window ending on `2017-08-23` with 365 days
/// starts on `2016-08-23`. A negative count, or one that runs past the
/// calendar range chrono can represent, is a `DataIntegrity` error.
pub fn trailing_window_start(recent_date: &str, days: i64) -> Result<String, ApiError> {
    let recent = NaiveDate::parse_from_str(recent_date, DATE_FORMAT).map_err(|e| {
        ApiError::DataIntegrity(format!(
            "most recent measurement date '{}' is not YYYY-MM-DD: {}",
            recent_date, e
        ))
    })?;

    let start = u64::try_from(days)
        .ok()
        .and_then(|days| recent.checked_sub_days(Days::new(days)))
        .ok_or_else(|| {
            ApiError::DataIntegrity(format!("cannot go back {} days from {}", days, recent_date))
        })?;

    Ok(start.format(DATE_FORMAT).to_string())
}

/// Start of the trailing window relative to the newest measurement overall.
fn window_start(store: &mut dyn ClimateStore, days: i64) -> Result<String, ApiError> {
    let recent_date = store.latest_date()?.ok_or_else(|| {
        ApiError::DataIntegrity("measurement table is empty; no most recent date".to_string())
    })?;

    trailing_window_start(&recent_date, days)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /` — HTML list of the available routes.
pub fn welcome() -> String {
    let mut body = String::from("Available Routes:<br/>");
    body.push_str(&ROUTES.join("<br/>"));
    body
}

/// `GET /api/v1.0/precipitation`
///
/// Rows are folded into a map in store order; when several stations report
/// the same date the last one wins.
pub fn precipitation(
    store: &mut dyn ClimateStore,
    window_days: i64,
) -> Result<PrecipitationResponse, ApiError> {
    let since = window_start(store, window_days)?;
    let rows = store.precipitation_since(&since)?;

    let mut data = PrecipitationResponse::new();
    for (date, prcp) in rows {
        data.insert(date, prcp);
    }

    tracing::debug!(since = %since, dates = data.len(), "precipitation window");
    Ok(data)
}

/// `GET /api/v1.0/stations`
pub fn stations(store: &mut dyn ClimateStore) -> Result<StationsResponse, ApiError> {
    store.station_ids()
}

/// `GET /api/v1.0/tobs`
///
/// The window is anchored on the newest date across all stations, not the
/// newest date of the chosen station.
pub fn tobs(
    store: &mut dyn ClimateStore,
    window_days: i64,
) -> Result<Vec<TemperatureObservation>, ApiError> {
    let station = store.most_active_station()?.ok_or_else(|| {
        ApiError::DataIntegrity("measurement table is empty; no most active station".to_string())
    })?;

    let since = window_start(store, window_days)?;
    tracing::debug!(station = %station, since = %since, "tobs window");

    store.temperature_observations(&station, &since)
}

/// `GET /api/v1.0/<start>`
///
/// `start` is compared as text; a value past the data or not a date at all
/// just yields null aggregates.
pub fn temperature_from(
    store: &mut dyn ClimateStore,
    start: &str,
) -> Result<TemperatureSummary, ApiError> {
    let aggregates = store.temperature_summary(start, None)?;

    Ok(TemperatureSummary {
        start_date: start.to_string(),
        end_date: None,
        min_temp: aggregates.min,
        avg_temp: aggregates.avg,
        max_temp: aggregates.max,
    })
}

/// `GET /api/v1.0/<start>/<end>`
pub fn temperature_between(
    store: &mut dyn ClimateStore,
    start: &str,
    end: &str,
) -> Result<TemperatureSummary, ApiError> {
    let aggregates = store.temperature_summary(start, Some(end))?;

    Ok(TemperatureSummary {
        start_date: start.to_string(),
        end_date: Some(end.to_string()),
        min_temp: aggregates.min,
        avg_temp: aggregates.avg,
        max_temp: aggregates.max,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
