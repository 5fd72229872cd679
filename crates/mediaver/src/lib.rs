//! # Mediaver
//!
//! Media-type API versioning for Rust web services.
//!
//! Clients pick an API version through the `Accept` header:
//!
//! ```text
//! Accept: application/vnd.acme+json; version=2.0
//! ```
//!
//! Handlers are tagged with the version they serve, several versions of the
//! same path and method live side by side, and the OpenAPI document lists
//! each path once with one media type per version.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mediaver::prelude::*;
//!
//! #[derive(Serialize, Schema)]
//! struct Item {
//!     name: String,
//! }
//!
//! async fn items_v1() -> Json<Item> {
//!     Json(Item { name: "widget".into() })
//! }
//!
//! async fn items_v2() -> Json<Item> {
//!     Json(Item { name: "widget".into() })
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     Mediaver::new()
//!         .versioning("application/vnd.acme+json")
//!         .route("/items", get(versioned((1, 0), items_v1)))
//!         .route("/items", get(items_v2).version((2, 0)))
//!         .run("127.0.0.1:8080")
//!         .await
//! }
//! ```
//!
//! ## Negotiation
//!
//! | `Accept`                                   | Result                         |
//! |--------------------------------------------|--------------------------------|
//! | absent, `*/*`, `application/json`          | default version `1.0`          |
//! | `<vendor>; version=X.Y`                    | handler tagged `X.Y`, else 405 |
//! | another media type with a parameter        | 406 "Wrong media type"         |
//! | `<vendor>; vers=1.1`                       | 400 "No version in Accept header" |
//! | `<vendor>; version=1-1`                    | 400 "Version should be in <major>.<minor> format" |
//!
//! WebSocket handshakes skip negotiation.

// Re-export core functionality
pub use mediaver_core::*;

/// OpenAPI types and the versioned document generator
pub use mediaver_openapi as openapi;

pub use mediaver_openapi::versioning::{ApiVersion, VersioningConfig, DEFAULT_VERSION};

/// Prelude module - import everything you need with `use mediaver::prelude::*`
pub mod prelude {
    // Core types
    pub use mediaver_core::{
        delete,
        get,
        init_versioning,
        on,
        patch,
        post,
        put,
        versioned,
        // Error handling
        ApiError,
        Body,
        Html,
        // Response types
        IntoResponse,
        // Extractors
        Json,
        // App builder
        Mediaver,
        MediaverSettings,
        NegotiatedVersion,
        Path,
        Query,
        // Request context
        Request,
        Response,
        Result,
        // Router
        Router,
        State,
        // Middleware
        TracingLayer,
        Versioned,
        VersionedRouter,
    };

    pub use mediaver_openapi::versioning::{ApiVersion, DEFAULT_VERSION};

    // Re-export OpenAPI schema derive
    pub use mediaver_openapi::Schema;

    // Re-export commonly used external types
    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, trace, warn};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports_work() {
        let _: fn() -> Result<()> = || Ok(());
        assert_eq!(DEFAULT_VERSION, ApiVersion::new(1, 0));
    }
}
