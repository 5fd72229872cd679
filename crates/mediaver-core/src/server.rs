//! HTTP server implementation
//!
//! Every request runs through the middleware stack first; routing is the
//! innermost step of the chain. The same [`Pipeline`] serves the hyper
//! server and the in-process test client.

use crate::error::{allow_header_value, ApiError};
use crate::middleware::{BoxedNext, LayerStack};
use crate::request::Request;
use crate::response::{is_json, IntoResponse, Response};
use crate::router::{RouteMatch, Router};
use http::header::{self, HeaderName};
use http::{Extensions, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use mediaver_openapi::versioning::VersioningConfig;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Middleware stack wrapped around the router
pub(crate) struct Pipeline {
    router: Arc<Router>,
    layers: LayerStack,
    versioning: Option<VersioningConfig>,
}

impl Pipeline {
    pub(crate) fn new(
        router: Router,
        layers: LayerStack,
        versioning: Option<VersioningConfig>,
    ) -> Self {
        Self {
            router: Arc::new(router),
            layers,
            versioning,
        }
    }

    /// Shared application state handed to every request
    pub(crate) fn state(&self) -> Arc<Extensions> {
        self.router.state_ref()
    }

    /// Run `req` through the middleware stack and the router
    pub(crate) fn handle(
        &self,
        req: Request,
    ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>> {
        let router = self.router.clone();
        let versioning = self.versioning.clone();

        let routing: BoxedNext = Arc::new(move |req: Request| {
            let router = router.clone();
            let versioning = versioning.clone();
            Box::pin(async move { dispatch(router, versioning, req).await })
                as Pin<Box<dyn Future<Output = Response> + Send + 'static>>
        });

        self.layers.execute(req, routing)
    }
}

/// Select the endpoint for `req` and call it
async fn dispatch(
    router: Arc<Router>,
    versioning: Option<VersioningConfig>,
    mut req: Request,
) -> Response {
    let negotiated = req.negotiated_version();

    let (handler, version, params) = match router.match_route(req.path(), req.method(), negotiated) {
        RouteMatch::Found { endpoint, params } => {
            (endpoint.handler.clone(), endpoint.version, params)
        }
        RouteMatch::NotFound => {
            debug!(method = %req.method(), path = %req.path(), "No route matched");
            return ApiError::not_found().into_response();
        }
        RouteMatch::MethodNotAllowed { allowed } => {
            debug!(
                method = %req.method(),
                path = %req.path(),
                negotiated = ?negotiated,
                "No handler for method and version"
            );
            let mut response = ApiError::method_not_allowed().into_response();
            set_header(&mut response, header::ALLOW, &allow_header_value(&allowed));
            return response;
        }
    };

    req.set_path_params(params);
    let mut response = handler(req).await;

    // Error bodies keep `application/json`
    if let (Some(version), Some(config)) = (version, versioning.as_ref()) {
        if response.status().is_success() && is_json(&response) {
            set_header(&mut response, header::CONTENT_TYPE, &config.content_type(version));
        }
    }

    response
}

fn set_header(response: &mut Response, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response.headers_mut().insert(name, value);
        }
        Err(_) => warn!(header = %name, value, "Skipping invalid header value"),
    }
}

/// Internal server struct
pub(crate) struct Server {
    pipeline: Arc<Pipeline>,
}

impl Server {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Run the server
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Mediaver server running on http://{}", addr);

        loop {
            let (stream, _remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let pipeline = self.pipeline.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let pipeline = pipeline.clone();
                    async move { Ok::<_, Infallible>(handle_request(pipeline, req).await) }
                });

                if let Err(err) = http1::Builder::new()
                    .serve_connection(io, service)
                    .with_upgrades()
                    .await
                {
                    error!("Connection error: {}", err);
                }
            });
        }
    }
}

/// Handle a single HTTP request
async fn handle_request(pipeline: Arc<Pipeline>, req: hyper::Request<Incoming>) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let response = ApiError::from(err).into_response();
            log_request(&method, &path, response.status(), start);
            return response;
        }
    };

    let request = Request::new(parts, body, pipeline.state());
    let response = pipeline.handle(request).await;

    log_request(&method, &path, response.status(), start);
    response
}

/// Log request completion
fn log_request(method: &Method, path: &str, status: StatusCode, start: Instant) {
    let elapsed = start.elapsed();

    if status.is_server_error() || status.is_client_error() {
        warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Json;
    use crate::middleware::VersionNegotiationLayer;
    use crate::router::{get, post};
    use crate::version_tag::versioned;
    use bytes::Bytes;
    use serde::Serialize;

    const VENDOR: &str = "application/vnd.some.name+json";

    #[derive(Serialize, utoipa::ToSchema)]
    struct Items {
        count: u32,
    }

    async fn items_v1() -> Json<Items> {
        Json(Items { count: 1 })
    }

    async fn items_v2() -> Json<Items> {
        Json(Items { count: 2 })
    }

    async fn missing_v2() -> crate::error::Result<Json<Items>> {
        Err(ApiError::not_found())
    }

    async fn health() -> &'static str {
        "ok"
    }

    fn pipeline() -> Pipeline {
        let router = Router::new()
            .route("/items", get(versioned((1, 0), items_v1)))
            .route("/items", get(versioned((2, 0), items_v2)))
            .route("/items", post(versioned((2, 0), items_v2)))
            .route("/health", get(health))
            .route("/missing", get(versioned((2, 0), missing_v2)));

        let config = VersioningConfig::new(VENDOR);
        let mut layers = LayerStack::new();
        layers.prepend(Box::new(VersionNegotiationLayer::new(config.clone())));
        Pipeline::new(router, layers, Some(config))
    }

    async fn send(pipeline: &Pipeline, method: Method, path: &str, accept: Option<&str>) -> Response {
        let mut builder = http::Request::builder().method(method).uri(path);
        if let Some(accept) = accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        pipeline
            .handle(Request::new(parts, Bytes::new(), pipeline.state()))
            .await
    }

    async fn body_of(response: Response) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn versioned_json_gets_vendor_content_type() {
        let pipeline = pipeline();
        let response = send(&pipeline, Method::GET, "/items", Some("application/vnd.some.name+json; version=2.0")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/vnd.some.name+json; version=2.0"
        );
        assert_eq!(&body_of(response).await[..], br#"{"count":2}"#);
    }

    #[tokio::test]
    async fn unversioned_responses_keep_their_content_type() {
        let pipeline = pipeline();
        let response = send(&pipeline, Method::GET, "/health", Some("application/vnd.some.name+json; version=2.0")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }

    #[tokio::test]
    async fn versioned_errors_keep_plain_json_content_type() {
        let pipeline = pipeline();
        let response = send(&pipeline, Method::GET, "/missing", Some("application/vnd.some.name+json; version=2.0")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(&body_of(response).await[..], br#"{"detail":"Not Found"}"#);
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let response = send(&pipeline(), Method::GET, "/nothing", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(&body_of(response).await[..], br#"{"detail":"Not Found"}"#);
    }

    #[tokio::test]
    async fn version_mismatch_is_405_with_allow_header() {
        let response = send(&pipeline(), Method::POST, "/items", None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, POST");
        assert_eq!(&body_of(response).await[..], br#"{"detail":"Method Not Allowed"}"#);
    }

    #[tokio::test]
    async fn negotiation_runs_before_routing() {
        let response = send(&pipeline(), Method::GET, "/nothing", Some("text/html; version=1.0")).await;
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    }
}
