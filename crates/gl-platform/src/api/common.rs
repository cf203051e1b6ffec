//! Common API types and utilities

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::PlatformError;

/// Standard API error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            PlatformError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                ApiError::new("NOT_FOUND", self.to_string()),
            ),
            PlatformError::Duplicate { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("DUPLICATE", self.to_string()),
            ),
            PlatformError::Validation { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("VALIDATION_ERROR", self.to_string()),
            ),
            PlatformError::Unauthorized { .. }
            | PlatformError::InvalidCredentials
            | PlatformError::TokenExpired
            | PlatformError::InvalidToken { .. } => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("UNAUTHORIZED", self.to_string()),
            ),
            PlatformError::Forbidden { .. } => (
                StatusCode::FORBIDDEN,
                ApiError::new("FORBIDDEN", self.to_string()),
            ),
            PlatformError::Store(detail) => {
                error!(detail = %detail, "Revocation store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiError::new("SERVICE_UNAVAILABLE", "Service temporarily unavailable"),
                )
            }
            PlatformError::Database(_) | PlatformError::Internal { .. } => {
                // Detail stays server-side; the client gets an opaque
                // reference id to quote in support requests.
                let reference = Uuid::new_v4();
                error!(reference = %reference, detail = %self, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("INTERNAL_ERROR", format!("Internal error (ref {})", reference)),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

/// Success response with optional message
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}
