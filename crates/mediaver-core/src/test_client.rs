//! In-process client for end-to-end tests
//!
//! Requests go through the same pipeline as the server: version
//! negotiation, user layers, routing and the handler, without binding a
//! socket.
//!
//! ```rust,ignore
//! let app = Mediaver::new()
//!     .versioning("application/vnd.acme+json")
//!     .route("/items", get(versioned((2, 0), list_items)));
//! let client = TestClient::new(app);
//!
//! client
//!     .get_versioned("/items", "application/vnd.acme+json; version=2.0")
//!     .await
//!     .assert_status(200)
//!     .assert_header("content-type", "application/vnd.acme+json; version=2.0");
//! ```

use crate::app::Mediaver;
use crate::request::Request;
use crate::response::Response;
use crate::server::Pipeline;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde::{de::DeserializeOwned, Serialize};

/// Test client for integration testing without network binding
pub struct TestClient {
    pipeline: Pipeline,
}

impl TestClient {
    /// Build `app` and wrap its pipeline
    ///
    /// # Panics
    ///
    /// Panics if the app cannot be built, e.g. versioned routes without
    /// versioning.
    pub fn new(app: Mediaver) -> Self {
        Self {
            pipeline: app.build(),
        }
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    /// Send a GET request with an `Accept` header
    pub async fn get_versioned(&self, path: &str, accept: &str) -> TestResponse {
        self.request(TestRequest::get(path).accept(accept)).await
    }

    /// Send a POST request with JSON body
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> TestResponse {
        self.request(TestRequest::post(path).json(body)).await
    }

    /// Send a request with full control
    ///
    /// ```rust,ignore
    /// let response = client.request(
    ///     TestRequest::post("/items")
    ///         .accept("application/vnd.acme+json; version=1.1")
    ///         .json(&NewItem { name: "lamp" })
    /// ).await;
    /// ```
    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let mut builder = http::Request::builder().method(req.method).uri(req.path.as_str());
        for (key, value) in req.headers.iter() {
            builder = builder.header(key, value);
        }

        let (parts, _) = match builder.body(()) {
            Ok(request) => request.into_parts(),
            Err(err) => panic!("Invalid test request for `{}`: {}", req.path, err),
        };

        let request = Request::new(parts, req.body.unwrap_or_default(), self.pipeline.state());
        let response = self.pipeline.handle(request).await;
        TestResponse::from_response(response).await
    }
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl TestRequest {
    /// Create a request with the given method and path
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST request
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a PUT request
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Create a PATCH request
    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Create a DELETE request
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header, appending to any previous value
    ///
    /// Invalid names or values are ignored.
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (key.parse::<HeaderName>(), HeaderValue::from_str(value)) {
            self.headers.append(name, value);
        }
        self
    }

    /// Set the `Accept` header
    pub fn accept(self, accept: &str) -> Self {
        self.header("accept", accept)
    }

    /// Set the request body as JSON with `Content-Type: application/json`
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(body) {
            self.body = Some(Bytes::from(bytes));
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    /// Set the request body as raw bytes
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Test response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .unwrap_or_default();

        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Get the response status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header as a string, if present and valid UTF-8
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    /// Get the response body as bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Assert the status code
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert a header value
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or doesn't match.
    pub fn assert_header(&self, key: &str, expected: &str) -> &Self {
        let actual = self.header(key).unwrap_or("");
        assert_eq!(
            actual, expected,
            "Expected header '{}' to be '{}', got '{}'",
            key, expected, actual
        );
        self
    }

    /// Assert the `{"detail": ...}` error body
    ///
    /// # Panics
    ///
    /// Panics if the body is not an error body with `expected` as detail.
    pub fn assert_detail(&self, expected: &str) -> &Self {
        let body: serde_json::Value = match self.json() {
            Ok(body) => body,
            Err(err) => panic!("Expected a JSON error body, got '{}': {}", self.text(), err),
        };
        assert_eq!(body, serde_json::json!({ "detail": expected }));
        self
    }
}
