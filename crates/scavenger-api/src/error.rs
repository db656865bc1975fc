//! Scavenger — API error types.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use scavenger_core::error::DomainError;
use scavenger_hunts::application::loader::LoadError;
use serde::Serialize;
use thiserror::Error;

/// Startup errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Hunt documents could not be loaded.
    #[error("hunt loading error: {0}")]
    Hunts(#[from] LoadError),

    /// Publishing hunts or migrating the event store failed.
    #[error("startup error: {0}")]
    Domain(#[from] DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            DomainError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            DomainError::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
            DomainError::Busy(_) => (StatusCode::SERVICE_UNAVAILABLE, "busy"),
            DomainError::ConcurrencyConflict { .. } => {
                (StatusCode::CONFLICT, "concurrency_conflict")
            }
            DomainError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        if self.0.is_transient() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::not_found("hunt", Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        assert_eq!(
            status_of(DomainError::InvalidInput("choice 7".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_invalid_state_and_conflict_map_to_409() {
        assert_eq!(
            status_of(DomainError::InvalidState("completed".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::ConcurrencyConflict {
                aggregate_id: Uuid::new_v4(),
                expected: 1,
                actual: 2,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_busy_maps_to_503_with_retry_after() {
        let response = ApiError(DomainError::Busy("locked".into())).into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        let response = ApiError(DomainError::Infrastructure("db down".into())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
