//! Error types for the SDS materials backend.
//!
//! Two layers only:
//!
//! - [`StoreError`] - a query round-trip against the backing store failed
//! - [`ServiceError`] - request-level failures surfaced to callers
//!
//! Isolated per-fetch and per-record failures never reach these types; they
//! are absorbed inside the aggregation service and reported through its
//! `DetailFailure` channel instead.

use thiserror::Error;

/// Failure of a single store round-trip.
///
/// Repositories surface this for query failures only; a query that matches
/// no rows is a successful empty result, never an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying driver rejected or aborted the query.
    #[error("store query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// The store could not be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Request-level errors returned by the aggregation service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected before any store access.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The page-level count or listing query failed. Without the master
    /// list there is nothing to aggregate, so this aborts the request.
    #[error("aggregation failed: {0}")]
    Aggregation(#[from] StoreError),
}

impl ServiceError {
    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument(_) => "BAD_REQUEST",
            ServiceError::Aggregation(_) => "STORE_FAILURE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let invalid = ServiceError::InvalidArgument("page must be >= 1".into());
        assert_eq!(invalid.code(), "BAD_REQUEST");

        let aggregation = ServiceError::Aggregation(StoreError::Unavailable("down".into()));
        assert_eq!(aggregation.code(), "STORE_FAILURE");
    }

    #[test]
    fn test_store_error_is_wrapped_in_display() {
        let err = ServiceError::Aggregation(StoreError::Unavailable("connection refused".into()));
        assert!(err.to_string().contains("connection refused"));
    }
}
