//! Standard error schemas for OpenAPI documentation
//!
//! These schemas match the `{"detail": ...}` error body produced by Mediaver.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorSchema {
    /// Human-readable error message
    pub detail: String,
}

impl ErrorSchema {
    /// Sample body for a rejected media type
    pub fn wrong_media_type_example() -> Self {
        Self {
            detail: "Wrong media type".to_string(),
        }
    }

    /// Sample body for a route that exists without the requested method or version
    pub fn method_not_allowed_example() -> Self {
        Self {
            detail: "Method Not Allowed".to_string(),
        }
    }
}
