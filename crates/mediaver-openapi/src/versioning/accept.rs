//! `Accept` header version negotiation
//!
//! Clients ask for a version with
//!
//! ```text
//! Accept: application/vnd.acme+json; version=2.0
//! ```
//!
//! A missing header, `*/*`, or any value without exactly one `;` parameter
//! means no version was requested and the default version applies. A header
//! that does carry a parameter must name the configured vendor media type and
//! a single-digit `major.minor` version, otherwise the request is rejected.

use super::version::ApiVersion;
use http::StatusCode;
use thiserror::Error;

/// Wildcard media range that never triggers negotiation
pub const ANY_MEDIA_TYPE: &str = "*/*";

/// Why an `Accept` header was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NegotiationError {
    /// The header names a media type other than the vendor media type
    #[error("Wrong media type")]
    WrongMediaType,
    /// The parameter is not a `version=<value>` pair
    #[error("No version in Accept header")]
    MissingVersionParameter,
    /// The version value is not a single-digit `major.minor`
    #[error("Version should be in <major>.<minor> format")]
    MalformedVersion,
}

impl NegotiationError {
    /// HTTP status the rejection is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::WrongMediaType => StatusCode::NOT_ACCEPTABLE,
            Self::MissingVersionParameter | Self::MalformedVersion => StatusCode::BAD_REQUEST,
        }
    }
}

/// Parse an `Accept` header value into the requested version.
///
/// `header` is expected trimmed and lower-cased, as the negotiation
/// middleware passes it. Returns `Ok(None)` when the header does not ask for
/// a version.
pub fn parse_accept_header(
    header: Option<&str>,
    vendor_media_type: &str,
) -> Result<Option<ApiVersion>, NegotiationError> {
    let header = match header {
        None => return Ok(None),
        Some(h) if h.is_empty() || h == ANY_MEDIA_TYPE => return Ok(None),
        Some(h) => h,
    };

    let mut parts = header.split(';');
    let (media_type, parameter) = match (parts.next(), parts.next(), parts.next()) {
        (Some(media_type), Some(parameter), None) => (media_type, parameter),
        _ => return Ok(None),
    };

    if !media_type.trim().eq_ignore_ascii_case(vendor_media_type) {
        return Err(NegotiationError::WrongMediaType);
    }

    let mut pair = parameter.trim().split('=');
    let value = match (pair.next(), pair.next(), pair.next()) {
        (Some(key), Some(value), None) if key.trim().eq_ignore_ascii_case("version") => value,
        _ => return Err(NegotiationError::MissingVersionParameter),
    };

    parse_version_value(value).map(Some)
}

/// Validate a `version=` value: one digit, a dot, one digit.
fn parse_version_value(value: &str) -> Result<ApiVersion, NegotiationError> {
    match value.as_bytes() {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => Ok(
            ApiVersion::new(u32::from(major - b'0'), u32::from(minor - b'0')),
        ),
        _ => Err(NegotiationError::MalformedVersion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VENDOR: &str = "application/vnd.some.name+json";

    fn parse(header: &str) -> Result<Option<ApiVersion>, NegotiationError> {
        parse_accept_header(Some(header), VENDOR)
    }

    #[test]
    fn absent_or_wildcard_requests_no_version() {
        assert_eq!(parse_accept_header(None, VENDOR), Ok(None));
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("*/*"), Ok(None));
    }

    #[test]
    fn header_without_single_parameter_requests_no_version() {
        assert_eq!(parse("application/json"), Ok(None));
        assert_eq!(parse(VENDOR), Ok(None));
        assert_eq!(parse(&format!("{}; version=1.0; q=0.9", VENDOR)), Ok(None));
    }

    #[test]
    fn valid_header_yields_version() {
        assert_eq!(
            parse(&format!("{}; version=2.0", VENDOR)),
            Ok(Some(ApiVersion::new(2, 0)))
        );
        assert_eq!(
            parse(&format!("{};version=1.1", VENDOR)),
            Ok(Some(ApiVersion::new(1, 1)))
        );
        assert_eq!(
            parse(&format!("{}; version = 1.1", VENDOR)),
            Err(NegotiationError::MalformedVersion)
        );
    }

    #[test]
    fn other_media_type_is_not_acceptable() {
        let err = parse("application/vnd.wrong+json; version=1.0").unwrap_err();
        assert_eq!(err, NegotiationError::WrongMediaType);
        assert_eq!(err.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(err.to_string(), "Wrong media type");
    }

    #[test]
    fn parameter_without_version_key_is_missing_version() {
        for header in [
            format!("{}; vers1.1", VENDOR),
            format!("{}; vers=1.1", VENDOR),
            format!("{}; version=1=1", VENDOR),
        ] {
            let err = parse(&header).unwrap_err();
            assert_eq!(err, NegotiationError::MissingVersionParameter, "{}", header);
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn malformed_values_are_rejected() {
        for value in ["", "test", "0,.1", "0,1", "0,1,1", "0-1", "0/1", "1-1", "10.0", "1.10", "1.0.0"] {
            let err = parse(&format!("{}; version={}", VENDOR, value)).unwrap_err();
            assert_eq!(err, NegotiationError::MalformedVersion, "value {:?}", value);
            assert_eq!(err.to_string(), "Version should be in <major>.<minor> format");
        }
    }

    #[test]
    fn vendor_comparison_ignores_configured_case() {
        assert_eq!(
            parse_accept_header(
                Some("application/vnd.some.name+json; version=1.0"),
                "Application/Vnd.Some.Name+JSON"
            ),
            Ok(Some(ApiVersion::new(1, 0)))
        );
    }
}
