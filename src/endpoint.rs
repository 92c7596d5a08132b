/// HTTP endpoint for the climate API
///
/// Read-only REST surface over the measurement and station relations.
///
/// Endpoints:
/// - GET /                          - Route listing (HTML)
/// - GET /api/v1.0/precipitation    - Trailing-year precipitation by date
/// - GET /api/v1.0/stations         - All station ids
/// - GET /api/v1.0/tobs             - Trailing-year observations, most active station
/// - GET /api/v1.0/{start}          - Min/avg/max temperature from start
/// - GET /api/v1.0/{start}/{end}    - Min/avg/max temperature between start and end
///
/// Requests are served by a worker pool. Each request that touches the
/// store gets its own connection and read-only transaction from the
/// `StoreProvider`, released before the response is sent.

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::store::StoreProvider;
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;
use threadpool::ThreadPool;

const API_PREFIX: &str = "/api/v1.0/";

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// A parsed request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Welcome,
    Precipitation,
    Stations,
    Tobs,
    TemperatureFrom(String),
    TemperatureBetween(String, String),
}

impl Route {
    /// Parse a request URL into a route.
    ///
    /// The query string is ignored and a single trailing slash tolerated.
    /// Date segments are percent-decoded (invalid UTF-8 becomes U+FFFD) but
    /// otherwise passed through untouched; they are never validated as dates.
    pub fn parse(url: &str) -> Result<Route, ApiError> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        if path.is_empty() || path == "/" {
            return Ok(Route::Welcome);
        }

        let not_found = || ApiError::NotFound(path.to_string());
        let path = path.strip_suffix('/').unwrap_or(path);
        let rest = path.strip_prefix(API_PREFIX).ok_or_else(not_found)?;

        let segments = rest
            .split('/')
            .map(|segment| {
                let bytes = urlencoding::decode_binary(segment.as_bytes());
                String::from_utf8_lossy(&bytes).into_owned()
            })
            .collect::<Vec<String>>();

        if segments.iter().any(|s| s.is_empty()) {
            return Err(not_found());
        }

        match segments.as_slice() {
            [only] => Ok(match only.as_str() {
                "precipitation" => Route::Precipitation,
                "stations" => Route::Stations,
                "tobs" => Route::Tobs,
                _ => Route::TemperatureFrom(only.clone()),
            }),
            [start, end] => Ok(Route::TemperatureBetween(start.clone(), end.clone())),
            _ => Err(not_found()),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A response ready to be written, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, ApiError> {
        Ok(Self {
            status,
            content_type: "application/json",
            body: serde_json::to_string_pretty(value)?,
        })
    }

    /// JSON error body for a failed request.
    pub fn error(err: &ApiError) -> Self {
        let body = match err {
            ApiError::NotFound(path) => serde_json::json!({
                "error": "Not found",
                "path": path,
                "available_endpoints": handlers::ROUTES,
            }),
            _ => serde_json::json!({ "error": err.to_string() }),
        };

        Self {
            status: err.status_code(),
            content_type: "application/json",
            body: serde_json::to_string_pretty(&body).unwrap_or_default(),
        }
    }
}

/// Route and answer a single request.
pub fn handle_request<P: StoreProvider>(
    provider: &P,
    window_days: i64,
    method: &str,
    url: &str,
) -> Reply {
    let result = Route::parse(url).and_then(|route| {
        // tiny_http drops the body of a HEAD response
        if !(method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD")) {
            return Err(ApiError::MethodNotAllowed(method.to_string()));
        }
        dispatch(provider, window_days, route)
    });

    match result {
        Ok(reply) => reply,
        Err(err) => {
            if err.status_code() >= 500 {
                tracing::error!(%method, %url, error = %err, "request failed");
            }
            Reply::error(&err)
        }
    }
}

fn dispatch<P: StoreProvider>(provider: &P, window_days: i64, route: Route) -> Result<Reply, ApiError> {
    match route {
        Route::Welcome => Ok(Reply::html(handlers::welcome())),
        Route::Precipitation => provider.with_store(|store| {
            Reply::json(200, &handlers::precipitation(store, window_days)?)
        }),
        Route::Stations => {
            provider.with_store(|store| Reply::json(200, &handlers::stations(store)?))
        }
        Route::Tobs => {
            provider.with_store(|store| Reply::json(200, &handlers::tobs(store, window_days)?))
        }
        Route::TemperatureFrom(start) => provider.with_store(|store| {
            Reply::json(200, &handlers::temperature_from(store, &start)?)
        }),
        Route::TemperatureBetween(start, end) => provider.with_store(|store| {
            Reply::json(200, &handlers::temperature_between(store, &start, &end)?)
        }),
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Bind the HTTP listener described by `config`.
pub fn bind(config: &ServiceConfig) -> Result<tiny_http::Server, Box<dyn Error + Send + Sync>> {
    let server = tiny_http::Server::http(config.bind_address())?;
    tracing::info!(address = %config.bind_address(), "HTTP endpoint listening");
    Ok(server)
}

/// Serve requests from `server` until it is closed.
pub fn serve<P: StoreProvider + 'static>(server: tiny_http::Server, config: &ServiceConfig, provider: P) {
    let pool = ThreadPool::new(config.server.workers);
    let provider = Arc::new(provider);
    let window_days = config.window.trailing_days;

    for request in server.incoming_requests() {
        let provider = Arc::clone(&provider);
        pool.execute(move || respond(request, provider.as_ref(), window_days));
    }

    pool.join();
}

/// Start HTTP endpoint server using the listener settings in `config`
pub fn start_endpoint_server<P: StoreProvider + 'static>(
    config: &ServiceConfig,
    provider: P,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let server = bind(config)?;
    for route in handlers::ROUTES {
        tracing::info!("   GET {}", route);
    }
    serve(server, config, provider);
    Ok(())
}

fn respond<P: StoreProvider>(request: tiny_http::Request, provider: &P, window_days: i64) {
    let started = Instant::now();
    let method = request.method().as_str().to_string();
    let url = request.url().to_string();

    let reply = handle_request(provider, window_days, &method, &url);
    let status = reply.status;

    if let Err(e) = request.respond(create_response(reply)) {
        tracing::warn!(%method, %url, error = %e, "failed to send response");
        return;
    }

    tracing::info!(
        %method,
        %url,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
}

/// Create HTTP response from a reply
fn create_response(reply: Reply) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let response = tiny_http::Response::from_data(reply.body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(reply.status));

    match tiny_http::Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
