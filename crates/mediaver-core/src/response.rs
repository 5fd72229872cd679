//! Response types for Mediaver
//!
//! The core trait is [`IntoResponse`], which allows any type to be converted
//! into an HTTP response.
//!
//! | Type | Status | Content-Type |
//! |------|--------|--------------|
//! | `String` / `&str` | 200 | text/plain |
//! | `()` | 200 | - |
//! | [`Json<T>`] | 200 | application/json |
//! | [`Html<T>`] | 200 | text/html |
//! | [`ApiError`] | varies | application/json |
//!
//! JSON responses of handlers registered for an API version leave the
//! server with the vendor media type of that version instead of
//! `application/json`.

use crate::error::{ApiError, ErrorResponse};
use crate::extract::Json;
use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use http_body_util::Full;
use mediaver_openapi::{MediaType, Operation, ResponseModifier, ResponseSpec, Schema, SchemaRef};
use serde::Serialize;
use std::collections::BTreeMap;

/// HTTP Response type
pub type Response = http::Response<Full<Bytes>>;

/// Trait for types that can be converted into an HTTP response
pub trait IntoResponse {
    /// Convert self into a Response
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

// () - 200 OK with empty body
impl IntoResponse for () {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(self)))
            .unwrap()
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(self)))
            .unwrap()
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(self)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;
        response
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, HeaderMap, R) {
    fn into_response(self) -> Response {
        let mut response = self.2.into_response();
        *response.status_mut() = self.0;
        response.headers_mut().extend(self.1);
        response
    }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let error_response = ErrorResponse::from(self);
        let body = serde_json::to_vec(&error_response)
            .unwrap_or_else(|_| br#"{"detail":"Failed to serialize error"}"#.to_vec());

        http::Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap()
    }
}

fn error_response_spec(description: &str) -> ResponseSpec {
    ResponseSpec {
        description: description.to_string(),
        content: Some(BTreeMap::from([(
            "application/json".to_string(),
            MediaType {
                schema: SchemaRef::component("ErrorSchema"),
            },
        )])),
    }
}

impl ResponseModifier for ApiError {
    fn update_response(op: &mut Operation) {
        op.responses
            .insert("400".to_string(), error_response_spec("Bad Request"));
        op.responses
            .insert("500".to_string(), error_response_spec("Internal Server Error"));
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => http::Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(body)))
                .unwrap(),
            Err(err) => ApiError::internal("Failed to serialize response")
                .with_internal(err.to_string())
                .into_response(),
        }
    }
}

impl<T: for<'a> Schema<'a>> ResponseModifier for Json<T> {
    fn update_response(op: &mut Operation) {
        let schema = op.schema_ref::<T>();
        op.responses.insert(
            "200".to_string(),
            ResponseSpec {
                description: "Successful response".to_string(),
                content: Some(BTreeMap::from([(
                    "application/json".to_string(),
                    MediaType { schema },
                )])),
            },
        );
    }
}

/// HTML response wrapper
#[derive(Debug, Clone)]
pub struct Html<T>(pub T);

impl<T: Into<String>> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Full::new(Bytes::from(self.0.into())))
            .unwrap()
    }
}

impl<T> ResponseModifier for Html<T> {
    fn update_response(op: &mut Operation) {
        op.responses.insert(
            "200".to_string(),
            ResponseSpec {
                description: "HTML Content".to_string(),
                content: Some(BTreeMap::from([(
                    "text/html".to_string(),
                    MediaType {
                        schema: SchemaRef::Inline(serde_json::json!({ "type": "string" })),
                    },
                )])),
            },
        );
    }
}

/// Whether a response carries a JSON body
pub(crate) fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false)
}
