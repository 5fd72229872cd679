//! Document info and the paths the document is served under

use crate::spec::ApiInfo;

/// Where the OpenAPI document and the docs page are mounted, and the info
/// block written into the document
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiConfig {
    /// Document title
    pub title: String,
    /// Application version shown in the document, unrelated to API versions
    pub version: String,
    pub description: Option<String>,
    /// Route serving the merged JSON document
    pub json_path: String,
    /// Route serving the Swagger UI page
    pub docs_path: String,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            title: "Mediaver Application".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            json_path: "/openapi.json".to_string(),
            docs_path: "/docs".to_string(),
        }
    }
}

impl OpenApiConfig {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self::default().info(title, version, None::<String>)
    }

    /// Replace the info block
    pub fn info(
        mut self,
        title: impl Into<String>,
        version: impl Into<String>,
        description: Option<impl Into<String>>,
    ) -> Self {
        self.title = title.into();
        self.version = version.into();
        self.description = description.map(Into::into);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn json_path(mut self, path: impl Into<String>) -> Self {
        self.json_path = path.into();
        self
    }

    pub fn docs_path(mut self, path: impl Into<String>) -> Self {
        self.docs_path = path.into();
        self
    }

    /// Info block for the generated document
    pub fn api_info(&self) -> ApiInfo {
        ApiInfo {
            title: self.title.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
        }
    }
}
