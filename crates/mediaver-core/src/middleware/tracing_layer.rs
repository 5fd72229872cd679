//! Request tracing middleware
//!
//! Logs method, path, negotiated API version, status and duration of every
//! request inside an `http_request` span.

use super::layer::{BoxedNext, MiddlewareLayer};
use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{info_span, Instrument, Level};

/// Middleware layer that creates tracing spans for requests
///
/// Add it after versioning is initialized and the span records the version
/// the request negotiated (`default` when it asked for none).
///
/// ```rust,ignore
/// Mediaver::new()
///     .versioning("application/vnd.acme+json")
///     .layer(TracingLayer::new().with_field("service", "catalog"))
/// ```
#[derive(Clone)]
pub struct TracingLayer {
    level: Level,
    custom_fields: Vec<(String, String)>,
}

impl TracingLayer {
    /// Create a tracing layer logging completed requests at INFO
    pub fn new() -> Self {
        Self::with_level(Level::INFO)
    }

    /// Create a tracing layer logging successful requests at `level`
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            custom_fields: Vec::new(),
        }
    }

    /// Attach a static `key=value` pair to every request span
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.push((key.into(), value.into()));
        self
    }

    fn fields(&self) -> String {
        self.custom_fields
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TracingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareLayer for TracingLayer {
    fn call(
        &self,
        req: Request,
        next: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>> {
        let level = self.level;
        let method = req.method().to_string();
        let path = req.path().to_string();
        let version = req
            .negotiated_version()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "default".to_string());
        let fields = self.fields();

        Box::pin(async move {
            let start = Instant::now();

            let span = info_span!(
                "http_request",
                method = %method,
                path = %path,
                api_version = %version,
                fields = %fields,
                status = tracing::field::Empty,
                duration_ms = tracing::field::Empty,
            );

            let response = next(req).instrument(span.clone()).await;

            let status = response.status();
            let duration_ms = start.elapsed().as_millis() as u64;
            span.record("status", status.as_u16());
            span.record("duration_ms", duration_ms);

            let _enter = span.enter();
            if status.is_server_error() {
                tracing::error!(status = status.as_u16(), duration_ms, "Request failed");
            } else if status.is_client_error() {
                tracing::warn!(status = status.as_u16(), duration_ms, "Request rejected");
            } else {
                match level {
                    Level::TRACE => {
                        tracing::trace!(status = status.as_u16(), duration_ms, "Request completed")
                    }
                    Level::DEBUG => {
                        tracing::debug!(status = status.as_u16(), duration_ms, "Request completed")
                    }
                    Level::WARN => {
                        tracing::warn!(status = status.as_u16(), duration_ms, "Request completed")
                    }
                    Level::ERROR => {
                        tracing::error!(status = status.as_u16(), duration_ms, "Request completed")
                    }
                    _ => tracing::info!(status = status.as_u16(), duration_ms, "Request completed"),
                }
            }

            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::NegotiatedVersion;
    use crate::middleware::LayerStack;
    use crate::request::test_request;
    use crate::response::IntoResponse;
    use http::{Method, StatusCode};
    use mediaver_openapi::versioning::ApiVersion;
    use std::sync::Arc;

    fn status_handler(status: StatusCode) -> BoxedNext {
        Arc::new(move |_req: Request| {
            Box::pin(async move { status.into_response() })
                as Pin<Box<dyn Future<Output = Response> + Send + 'static>>
        })
    }

    #[test]
    fn custom_fields_are_joined() {
        let layer = TracingLayer::new()
            .with_field("service", "catalog")
            .with_field("region", "eu");
        assert_eq!(layer.fields(), "service=catalog region=eu");
    }

    #[tokio::test]
    async fn responses_pass_through_unchanged() {
        for status in [StatusCode::OK, StatusCode::NOT_ACCEPTABLE, StatusCode::INTERNAL_SERVER_ERROR] {
            let mut stack = LayerStack::new();
            stack.push(Box::new(TracingLayer::with_level(Level::DEBUG)));

            let mut req = test_request(Method::GET, "/items");
            req.extensions_mut().insert(NegotiatedVersion(ApiVersion::new(2, 0)));

            let response = stack.execute(req, status_handler(status)).await;
            assert_eq!(response.status(), status);
        }
    }
}
