//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses.

use crate::config::ConfigError;
use anistream_core::ports::PortError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to run the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed request input such as a path id that does not parse.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Well-formed but unacceptable input, such as out-of-range paging.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            ApiError::Port(port) => match port {
                PortError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
                PortError::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", Some(msg.clone())),
                PortError::Validation(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation_error",
                    Some(msg.clone()),
                ),
                PortError::Auth(msg) => (StatusCode::BAD_REQUEST, "auth_error", Some(msg.clone())),
                PortError::Upstream(msg) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "upstream_error",
                    Some(msg.clone()),
                ),
                PortError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
            },
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone())),
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                Some(msg.clone()),
            ),
            // Internal details are logged, never exposed.
            ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = self.parts();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "Request rejected: {}", self);
        }

        let body = ErrorBody {
            error: error.to_string(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: ApiError) -> StatusCode {
        error.into_response().status()
    }

    #[test]
    fn port_errors_map_to_documented_statuses() {
        assert_eq!(status_of(PortError::NotFound("x".into()).into()), StatusCode::NOT_FOUND);
        assert_eq!(status_of(PortError::Conflict("x".into()).into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(PortError::Auth("x".into()).into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(PortError::Validation("x".into()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(PortError::Upstream("x".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(PortError::Unexpected("x".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn request_errors_map_to_client_statuses() {
        assert_eq!(status_of(ApiError::BadRequest("id".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(ApiError::Validation("limit".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn internal_details_are_hidden() {
        let (_, error, detail) = ApiError::Internal("secret".into()).parts();
        assert_eq!(error, "internal_error");
        assert!(detail.is_none());
    }
}
