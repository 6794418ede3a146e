//! Maps domain `AppError` to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use courier_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Wrapper implementing `IntoResponse` for the domain error.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Serialization => (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR"),
            ErrorKind::Configuration => (StatusCode::BAD_REQUEST, "CONFIGURATION_ERROR"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Canceled => (StatusCode::CONFLICT, "CANCELED"),
            ErrorKind::Connection | ErrorKind::ExternalService => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
            }
            ErrorKind::Storage => {
                tracing::error!(error = %err.message, "Storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            ErrorKind::Internal => {
                tracing::error!(error = %err.message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message: err.message,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_maps_to_bad_request() {
        let response = ApiError(AppError::configuration("bad settings")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_canceled_maps_to_conflict() {
        let response = ApiError(AppError::canceled("canceled")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_external_service_maps_to_bad_gateway() {
        let response = ApiError(AppError::external("hub down")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
