//! API Version type and parsing
//!
//! Versions are `major.minor` pairs. Only equality is used when matching a
//! request to a handler; the ordering exists so collections of versions sort
//! predictably.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Version assumed for handlers without an explicit tag and for requests
/// that do not ask for a specific version.
pub const DEFAULT_VERSION: ApiVersion = ApiVersion::new(1, 0);

/// API version as a `(major, minor)` pair
///
/// The canonical string form is `"<major>.<minor>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApiVersion {
    /// Major version number
    pub major: u32,
    /// Minor version number
    pub minor: u32,
}

impl ApiVersion {
    /// Create a new version
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Vendor media type carrying this version, e.g.
    /// `application/vnd.acme+json; version=2.0`
    pub fn media_type(&self, vendor_media_type: &str) -> String {
        format!("{}; version={}", vendor_media_type, self)
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        DEFAULT_VERSION
    }
}

impl From<(u32, u32)> for ApiVersion {
    fn from((major, minor): (u32, u32)) -> Self {
        Self::new(major, minor)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (major, minor) = s.split_once('.').ok_or(VersionParseError::InvalidFormat)?;
        let parse = |part: &str| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionParseError::InvalidNumber);
            }
            part.parse::<u32>()
                .map_err(|_| VersionParseError::InvalidNumber)
        };

        Ok(ApiVersion::new(parse(major)?, parse(minor)?))
    }
}

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// Invalid number in version string
    #[error("invalid number in version")]
    InvalidNumber,
    /// Not in `major.minor` form
    #[error("invalid version format")]
    InvalidFormat,
    /// Empty version string
    #[error("empty version string")]
    Empty,
}
