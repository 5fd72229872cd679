//! Accept-header version negotiation middleware
//!
//! Reads the requested API version from the `Accept` header before any route
//! is selected. A valid version is stored in the request extensions as
//! [`NegotiatedVersion`] for the router and handlers to read; an invalid
//! header ends the exchange with `406` or `400` and a `{"detail": ...}` body.
//!
//! Protocol upgrade handshakes (WebSocket) are passed through untouched.

use super::layer::{BoxedNext, MiddlewareLayer};
use crate::error::ApiError;
use crate::extract::NegotiatedVersion;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use http::{header, HeaderMap};
use mediaver_openapi::versioning::{parse_accept_header, VersioningConfig};
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Middleware layer that negotiates the API version of every request
///
/// Installed automatically as the outermost layer once versioning is
/// initialized on the application.
#[derive(Clone, Debug)]
pub struct VersionNegotiationLayer {
    config: VersioningConfig,
}

impl VersionNegotiationLayer {
    /// Negotiate against the vendor media type of `config`
    pub fn new(config: VersioningConfig) -> Self {
        Self { config }
    }

    /// The versioning configuration this layer negotiates against
    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }
}

impl MiddlewareLayer for VersionNegotiationLayer {
    fn call(
        &self,
        mut req: Request,
        next: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>> {
        if is_upgrade_request(req.headers()) {
            return next(req);
        }

        let accept = req
            .headers()
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_ascii_lowercase());

        match parse_accept_header(accept.as_deref(), self.config.vendor_media_type()) {
            Ok(Some(version)) => {
                req.extensions_mut().insert(NegotiatedVersion(version));
                next(req)
            }
            Ok(None) => next(req),
            Err(err) => {
                debug!(
                    method = %req.method(),
                    path = %req.path(),
                    accept = accept.as_deref().unwrap_or(""),
                    error = %err,
                    "Rejected Accept header"
                );
                let response = ApiError::from(err).into_response();
                Box::pin(async move { response })
            }
        }
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

/// Whether the request is a protocol upgrade handshake
fn is_upgrade_request(headers: &HeaderMap) -> bool {
    let upgrades_to_websocket = headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);

    let connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    upgrades_to_websocket && connection_upgrade
}
