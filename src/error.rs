//! Gateway error types with HTTP status and wire code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a numeric code that is carried both in REST error bodies and in
//! WebSocket `error` replies, plus an HTTP status for REST.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All REST error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 3002,
///     "message": "coordinator unavailable"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum.
///
/// # Error Codes
///
/// | Code | Meaning                              | HTTP Status                |
/// |------|--------------------------------------|----------------------------|
/// | 1    | Reply could not be encoded           | 500 Internal Server Error  |
/// | 2    | Client message could not be decoded  | 400 Bad Request            |
/// | 1001 | Invalid REST request                 | 400 Bad Request            |
/// | 3002 | Coordinator loop has stopped         | 503 Service Unavailable    |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A reply envelope could not be serialized.
    #[error("failed to encode reply: {0}")]
    EncodeFailed(String),

    /// A client frame was not a valid request envelope.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The coordinator event loop is no longer accepting events.
    #[error("coordinator unavailable")]
    CoordinatorUnavailable,
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::EncodeFailed(_) => 1,
            Self::MalformedMessage(_) => 2,
            Self::InvalidRequest(_) => 1001,
            Self::CoordinatorUnavailable => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedMessage(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::CoordinatorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::EncodeFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::EncodeFailed(err.to_string())
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_nonzero_and_distinct() {
        let errors = [
            GatewayError::EncodeFailed(String::new()),
            GatewayError::MalformedMessage(String::new()),
            GatewayError::InvalidRequest(String::new()),
            GatewayError::CoordinatorUnavailable,
        ];
        let mut codes: Vec<u32> = errors.iter().map(GatewayError::error_code).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn coordinator_unavailable_maps_to_503() {
        let response = GatewayError::CoordinatorUnavailable.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn invalid_request_maps_to_400_with_code_1001() {
        let err = GatewayError::InvalidRequest("duplicate field `id`".to_string());
        assert_eq!(err.error_code(), 1001);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_message_code_is_two() {
        let err = GatewayError::MalformedMessage("bad".to_string());
        assert_eq!(err.error_code(), 2);
        assert_eq!(err.to_string(), "malformed message: bad");
    }
}
