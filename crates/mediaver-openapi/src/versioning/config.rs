//! Versioning configuration shared by negotiation, routing and documentation

use super::version::ApiVersion;
use std::sync::Arc;

/// Vendor media type used for version negotiation
///
/// Built once when versioning is initialized and shared read-only by the
/// negotiation middleware, the router and the OpenAPI document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersioningConfig {
    vendor_media_type: Arc<str>,
}

impl VersioningConfig {
    /// Create a configuration for the given vendor media type,
    /// e.g. `application/vnd.acme+json`
    pub fn new(vendor_media_type: impl AsRef<str>) -> Self {
        Self {
            vendor_media_type: Arc::from(vendor_media_type.as_ref().trim()),
        }
    }

    /// The configured vendor media type
    pub fn vendor_media_type(&self) -> &str {
        &self.vendor_media_type
    }

    /// Content type emitted for responses of a handler tagged `version`
    pub fn content_type(&self, version: ApiVersion) -> String {
        version.media_type(&self.vendor_media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_uses_vendor_and_version() {
        let config = VersioningConfig::new(" application/vnd.acme+json ");
        assert_eq!(config.vendor_media_type(), "application/vnd.acme+json");
        assert_eq!(
            config.content_type(ApiVersion::new(2, 0)),
            "application/vnd.acme+json; version=2.0"
        );
    }
}
