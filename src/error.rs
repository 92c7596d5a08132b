//! Error type shared by the handlers and the HTTP layer.

use crate::db::DbConfigError;
use thiserror::Error;

/// Every way a request can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The store is missing data a handler cannot do without, such as a
    /// most recent measurement date.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// A query against the store failed.
    #[error("store query failed: {0}")]
    Store(#[from] postgres::Error),

    /// A per-request connection could not be opened.
    #[error("store unavailable: {0}")]
    Connection(#[from] DbConfigError),

    /// A response body could not be encoded.
    #[error("failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),
}

impl ApiError {
    /// HTTP status code reported for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::DataIntegrity(_)
            | ApiError::Store(_)
            | ApiError::Connection(_)
            | ApiError::Serialization(_) => 500,
            ApiError::NotFound(_) => 404,
            ApiError::MethodNotAllowed(_) => 405,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::DataIntegrity("empty".into()).status_code(), 500);
        assert_eq!(ApiError::Connection(DbConfigError::MissingDatabaseUrl).status_code(), 500);
        assert_eq!(ApiError::NotFound("/nope".into()).status_code(), 404);
        assert_eq!(ApiError::MethodNotAllowed("POST".into()).status_code(), 405);
    }

    #[test]
    fn test_messages() {
        let e = ApiError::DataIntegrity("measurement table is empty".into());
        assert_eq!(e.to_string(), "data integrity: measurement table is empty");

        let e = ApiError::MethodNotAllowed("DELETE".into());
        assert_eq!(e.to_string(), "method DELETE not allowed");
    }

    #[test]
    fn test_error_is_send() {
        fn assert_impl<T: Send + std::error::Error>() {}
        assert_impl::<ApiError>();
    }
}
