//! Accept-header API versioning
//!
//! Clients select an API version through a vendor media type parameter:
//!
//! ```text
//! Accept: application/vnd.acme+json; version=2.0
//! ```
//!
//! This module holds the pieces shared by the server and the documentation:
//!
//! - [`ApiVersion`] and the [`DEFAULT_VERSION`]
//! - [`parse_accept_header`], the negotiation algorithm
//! - [`VersionedDocument`], which documents every version of an endpoint
//!   under a single path

mod accept;
mod config;
mod document;
mod merge;
mod version;

pub use accept::{parse_accept_header, NegotiationError, ANY_MEDIA_TYPE};
pub use config::VersioningConfig;
pub use document::{RouteOperation, VersionedDocument};
pub use merge::{deep_merge, merge_versioned_paths, split_synthetic_path, synthetic_path, VERSION_SEPARATOR};
pub use version::{ApiVersion, VersionParseError, DEFAULT_VERSION};
