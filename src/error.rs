// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Backend API error: {0}")]
    Backend(String),

    #[error("Places search error: {0}")]
    PlacesApi(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the failure should be retried on a later tick rather than
    /// treated as a programming or input error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Backend(_)
                | AppError::PlacesApi(_)
                | AppError::Timeout(_)
                | AppError::Unavailable(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Backend(msg) => (StatusCode::BAD_GATEWAY, "backend_error", Some(msg.clone())),
            AppError::PlacesApi(msg) => {
                (StatusCode::BAD_GATEWAY, "places_error", Some(msg.clone()))
            }
            AppError::Timeout(msg) => {
                (StatusCode::GATEWAY_TIMEOUT, "timeout", Some(msg.clone()))
            }
            AppError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Service unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type Result<T> = std::result::Result<T, AppError>;
