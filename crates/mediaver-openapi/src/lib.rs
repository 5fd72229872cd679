//! OpenAPI documentation and version negotiation for Mediaver
//!
//! This crate provides OpenAPI document generation, Swagger UI serving and
//! the Accept-header versioning primitives used by `mediaver-core`. It wraps
//! `utoipa` internally for schema derivation.
//!
//! # Features
//!
//! - OpenAPI document generated from registered routes
//! - Every version of an endpoint documented under one path
//! - Swagger UI serving at `/docs`
//! - JSON document at `/openapi.json`
//! - Schema derivation via `#[derive(Schema)]`
//!
//! # Usage
//!
//! ```rust,ignore
//! use mediaver::prelude::*;
//!
//! #[derive(Deserialize, Schema)]
//! struct Body {
//!     name: String,
//! }
//!
//! let mut app = Mediaver::new()
//!     .route("/items", post(create_v1).version((1, 0)))
//!     .route("/items", post(create_v2).version((2, 0)))
//!     .docs("/docs");
//! init_versioning(&mut app, "application/vnd.acme+json");
//! ```

mod config;
mod schemas;
mod spec;
#[cfg(feature = "swagger-ui")]
mod swagger;

pub mod versioning;

pub use config::OpenApiConfig;
pub use schemas::ErrorSchema;
pub use spec::{
    ApiInfo, MediaType, OpenApiSpec, Operation, OperationModifier, Parameter, PathItem,
    RequestBody, ResponseModifier, ResponseSpec, SchemaRef,
};

// Re-export utoipa's ToSchema derive macro as Schema
pub use utoipa::ToSchema as Schema;

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;

/// Generate OpenAPI JSON response
pub fn openapi_json(document: &serde_json::Value) -> Response<Full<Bytes>> {
    match serde_json::to_vec(document) {
        Ok(json) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(json)))
            .unwrap(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize OpenAPI document");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::from("Failed to serialize OpenAPI document")))
                .unwrap()
        }
    }
}

/// Generate Swagger UI HTML response
#[cfg(feature = "swagger-ui")]
pub fn swagger_ui_html(openapi_url: &str, title: &str) -> Response<Full<Bytes>> {
    let html = swagger::generate_swagger_html(openapi_url, title);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(html)))
        .unwrap()
}
