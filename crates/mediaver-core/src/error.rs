//! Error types for Mediaver

use http::{Method, StatusCode};
use mediaver_openapi::versioning::NegotiationError;
use serde::Serialize;
use std::fmt;

/// Result type alias for Mediaver operations
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Standard API error type
///
/// Every error leaves the server as `{"detail": "<message>"}` with the
/// error's status code. Internal details are logged and never serialized.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Human-readable error message
    pub message: String,
    /// Internal details (logged, never sent to the client)
    pub(crate) internal: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            internal: None,
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 404 Not Found error
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    /// Create a 405 Method Not Allowed error
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    }

    /// Create a 406 Not Acceptable error
    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_ACCEPTABLE, message)
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Add internal details (for logging, hidden from the response)
    pub fn with_internal(mut self, details: impl Into<String>) -> Self {
        self.internal = Some(details.into());
        self
    }

    /// Internal details, if any
    pub fn internal_details(&self) -> Option<&str> {
        self.internal.as_deref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

/// JSON representation of an API error response
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub detail: String,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        if let Some(internal) = &err.internal {
            tracing::error!(status = %err.status.as_u16(), internal = %internal, "{}", err.message);
        }
        Self {
            detail: err.message,
        }
    }
}

impl From<NegotiationError> for ApiError {
    fn from(err: NegotiationError) -> Self {
        ApiError::new(err.status(), err.to_string())
    }
}

// Conversion from common error types
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal("I/O error").with_internal(err.to_string())
    }
}

impl From<hyper::Error> for ApiError {
    fn from(err: hyper::Error) -> Self {
        ApiError::internal("HTTP error").with_internal(err.to_string())
    }
}

/// Comma-separated `Allow` header value for a 405 response
pub(crate) fn allow_header_value(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiation_errors_keep_status_and_message() {
        let err = ApiError::from(NegotiationError::WrongMediaType);
        assert_eq!(err.status, StatusCode::NOT_ACCEPTABLE);
        assert_eq!(err.message, "Wrong media type");

        let err = ApiError::from(NegotiationError::MalformedVersion);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Version should be in <major>.<minor> format");
    }

    #[test]
    fn internal_details_are_not_serialized() {
        let err = ApiError::internal("Something broke").with_internal("disk full");
        assert_eq!(err.internal_details(), Some("disk full"));

        let body = serde_json::to_value(ErrorResponse::from(err)).unwrap();
        assert_eq!(body, serde_json::json!({ "detail": "Something broke" }));
    }

    #[test]
    fn allow_header_lists_methods_in_order() {
        assert_eq!(allow_header_value(&[Method::GET, Method::POST]), "GET, POST");
        assert_eq!(allow_header_value(&[]), "");
    }
}
