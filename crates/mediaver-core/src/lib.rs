//! # Mediaver Core
//!
//! Host framework for Mediaver: request pipeline, router, extractors and
//! the media-type version negotiation middleware.
//!
//! This crate is not meant to be used directly. Use `mediaver` instead.

mod app;
mod config;
mod error;
mod extract;
mod handler;
pub mod middleware;
mod request;
mod response;
mod router;
mod server;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;
mod version_tag;

// Public API
pub use app::{init_versioning, Mediaver};
pub use config::{load_dotenv, ConfigError, MediaverSettings, ENV_PREFIX};
pub use error::{ApiError, Result};
pub use extract::{Body, FromRequest, FromRequestParts, Json, NegotiatedVersion, Path, Query, State};
pub use handler::Handler;
pub use http::Method;
pub use middleware::{TracingLayer, VersionNegotiationLayer};
pub use request::Request;
pub use response::{Html, IntoResponse, Response};
pub use router::{
    delete, get, on, patch, post, put, EndpointConflict, MethodRouter, RouteConflictError, Router,
    VersionedRouter,
};
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};
pub use version_tag::{versioned, Versioned};
