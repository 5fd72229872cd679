//! Version tags for handlers
//!
//! A handler is tied to an API version either by wrapping it before it is
//! registered:
//!
//! ```rust,ignore
//! .route("/items", get(versioned((2, 0), list_items_v2)))
//! ```
//!
//! or by tagging the method router after registration:
//!
//! ```rust,ignore
//! .route("/items", get(list_items_v2).version((2, 0)))
//! ```
//!
//! Both produce the same endpoint. Tagging again replaces the previous tag.

use crate::handler::Handler;
use crate::request::Request;
use mediaver_openapi::versioning::ApiVersion;
use mediaver_openapi::Operation;

/// A handler tagged with the API version it serves
#[derive(Debug, Clone)]
pub struct Versioned<H> {
    version: ApiVersion,
    handler: H,
}

impl<H> Versioned<H> {
    /// Tag `handler` with `version`
    pub fn new(version: impl Into<ApiVersion>, handler: H) -> Self {
        Self {
            version: version.into(),
            handler,
        }
    }

    /// The tagged version
    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// Replace the tag
    pub fn retag(mut self, version: impl Into<ApiVersion>) -> Self {
        self.version = version.into();
        self
    }
}

/// Tag `handler` with `version`
pub fn versioned<H>(version: impl Into<ApiVersion>, handler: H) -> Versioned<H> {
    Versioned::new(version, handler)
}

impl<H, T> Handler<T> for Versioned<H>
where
    H: Handler<T>,
{
    type Future = H::Future;

    fn call(self, req: Request) -> Self::Future {
        self.handler.call(req)
    }

    fn update_operation(op: &mut Operation) {
        H::update_operation(op);
    }

    fn version_tag(&self) -> Option<ApiVersion> {
        Some(self.version)
    }
}
