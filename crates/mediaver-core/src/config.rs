//! Environment configuration
//!
//! Settings are read from `MEDIAVER_*` environment variables, after loading
//! a `.env` file if one is present:
//!
//! | Variable                      | Field               |
//! |-------------------------------|---------------------|
//! | `MEDIAVER_VENDOR_MEDIA_TYPE`  | `vendor_media_type` |
//! | `MEDIAVER_DOCS_PATH`          | `docs_path`         |
//! | `MEDIAVER_JSON_PATH`          | `json_path`         |
//! | `MEDIAVER_TITLE`              | `title`             |

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Prefix of every environment variable read by [`MediaverSettings::from_env`]
pub const ENV_PREFIX: &str = "MEDIAVER_";

/// Error loading settings from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was present but could not be parsed
    #[error("invalid environment configuration: {0}")]
    Env(#[from] envy::Error),
}

/// Application settings loaded from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediaverSettings {
    /// Vendor media type; versioning is initialized when present
    pub vendor_media_type: Option<String>,
    /// Swagger UI path
    pub docs_path: Option<String>,
    /// OpenAPI JSON path
    pub json_path: Option<String>,
    /// Title of the OpenAPI document
    pub title: Option<String>,
}

impl MediaverSettings {
    /// Load `.env`, then read the `MEDIAVER_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_vars(std::env::vars())
    }

    /// Read settings from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let settings: Self = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        debug!(?settings, "Loaded settings");
        Ok(settings)
    }
}

/// Load environment variables from a `.env` file, if one exists
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => debug!(error = %err, "Could not load .env file"),
    }
}
