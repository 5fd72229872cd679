//! Middleware infrastructure for Mediaver
//!
//! Middleware is added with `.layer()` on [`Mediaver`](crate::Mediaver) and
//! runs before routing. Once versioning is initialized the
//! [`VersionNegotiationLayer`] is installed as the outermost layer, so every
//! other layer and every handler sees the negotiated version.
//!
//! ```rust,ignore
//! Mediaver::new()
//!     .versioning("application/vnd.acme+json")
//!     .layer(TracingLayer::new())
//!     .route("/", get(handler))
//!     .run("127.0.0.1:8080")
//!     .await
//! ```

mod layer;
mod negotiation;
mod tracing_layer;

pub use layer::{BoxedNext, LayerStack, MiddlewareLayer};
pub use negotiation::VersionNegotiationLayer;
pub use tracing_layer::TracingLayer;
