//! Versioned OpenAPI document generation with memoization

use super::config::VersioningConfig;
use super::merge::{merge_versioned_paths, synthetic_path};
use super::version::ApiVersion;
use crate::spec::{OpenApiSpec, Operation};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::info;

/// One registered operation as seen by the document generator
#[derive(Debug, Clone)]
pub struct RouteOperation {
    /// Route path as registered, e.g. `/users/{id}`
    pub path: String,
    /// HTTP method, any case
    pub method: String,
    /// Version tag, `None` for unversioned routes
    pub version: Option<ApiVersion>,
    /// Operation metadata collected from the handler signature
    pub operation: Operation,
}

/// OpenAPI document for an application with versioned routes
///
/// The document is generated on first access and then served from memory
/// for the rest of the process lifetime.
#[derive(Debug)]
pub struct VersionedDocument {
    base: OpenApiSpec,
    routes: Vec<RouteOperation>,
    config: Option<VersioningConfig>,
    cached: OnceLock<Value>,
}

impl VersionedDocument {
    /// Create a document from the base spec (info and schemas) and the
    /// application's route operations.
    ///
    /// Without a versioning configuration every route is documented under
    /// its own path and no merging takes place.
    pub fn new(
        base: OpenApiSpec,
        routes: Vec<RouteOperation>,
        config: Option<VersioningConfig>,
    ) -> Self {
        Self {
            base,
            routes,
            config,
            cached: OnceLock::new(),
        }
    }

    /// The merged document, generated on first call
    pub fn document(&self) -> &Value {
        self.cached.get_or_init(|| self.generate())
    }

    /// Whether the document has already been generated
    pub fn is_generated(&self) -> bool {
        self.cached.get().is_some()
    }

    fn generate(&self) -> Value {
        let mut spec = self.base.clone();

        for route in &self.routes {
            let mut operation = route.operation.clone();
            let path = match (route.version, &self.config) {
                (Some(version), Some(config)) => {
                    operation.set_success_media_type(&config.content_type(version));
                    synthetic_path(&route.path, version)
                }
                _ => route.path.clone(),
            };
            spec.add_operation(&path, &route.method, operation);
        }

        let mut document = spec.to_json();
        if let Some(config) = &self.config {
            merge_versioned_paths(&mut document, config.vendor_media_type());
        }

        info!(
            routes = self.routes.len(),
            paths = document["paths"].as_object().map_or(0, |paths| paths.len()),
            "Generated OpenAPI document"
        );

        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{MediaType, RequestBody, ResponseSpec, SchemaRef};
    use std::collections::BTreeMap;

    const VENDOR: &str = "application/vnd.some.name+json";

    fn json_body(schema: &str) -> Operation {
        let mut op = Operation::new();
        op.request_body = Some(RequestBody {
            required: true,
            content: BTreeMap::from([(
                "application/json".to_string(),
                MediaType {
                    schema: SchemaRef::component(schema),
                },
            )]),
        });
        op
    }

    fn json_response(schema: &str) -> Operation {
        let mut op = Operation::new();
        op.responses.insert(
            "200".to_string(),
            ResponseSpec {
                description: "Successful response".to_string(),
                content: Some(BTreeMap::from([(
                    "application/json".to_string(),
                    MediaType {
                        schema: SchemaRef::component(schema),
                    },
                )])),
            },
        );
        op
    }

    fn route(path: &str, method: &str, version: Option<(u32, u32)>, operation: Operation) -> RouteOperation {
        RouteOperation {
            path: path.to_string(),
            method: method.to_string(),
            version: version.map(ApiVersion::from),
            operation,
        }
    }

    fn fixture_routes() -> Vec<RouteOperation> {
        vec![
            route("/simple/", "GET", None, Operation::new()),
            route("/test/", "GET", Some((1, 0)), json_response("Message")),
            route("/test/", "GET", Some((2, 0)), json_response("Message")),
            route("/text/", "GET", Some((1, 0)), Operation::new()),
            route("/test/", "POST", Some((1, 0)), json_body("Body")),
            route("/test/", "POST", Some((1, 1)), json_body("Body2")),
        ]
    }

    #[test]
    fn versions_are_documented_side_by_side() {
        let doc = VersionedDocument::new(
            OpenApiSpec::new("Test", "1.0.0"),
            fixture_routes(),
            Some(VersioningConfig::new(VENDOR)),
        );

        let paths = doc.document()["paths"].as_object().unwrap();
        assert_eq!(paths.len(), 3);

        let test = paths["/test/"].as_object().unwrap();
        let methods: Vec<&str> = test.keys().map(String::as_str).collect();
        assert_eq!(methods, ["get", "post"]);

        let get_content = test["get"]["responses"]["200"]["content"].as_object().unwrap();
        assert_eq!(get_content.len(), 2);
        assert!(get_content.contains_key("application/vnd.some.name+json; version=2.0"));

        let post_body = test["post"]["requestBody"]["content"].as_object().unwrap();
        let keys: Vec<&str> = post_body.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "application/vnd.some.name+json; version=1.0",
                "application/vnd.some.name+json; version=1.1"
            ]
        );
    }

    #[test]
    fn unversioned_routes_keep_plain_content() {
        let doc = VersionedDocument::new(
            OpenApiSpec::new("Test", "1.0.0"),
            fixture_routes(),
            Some(VersioningConfig::new(VENDOR)),
        );

        let simple = &doc.document()["paths"]["/simple/"]["get"]["responses"]["200"];
        assert!(simple.get("content").is_none());

        let text = &doc.document()["paths"]["/text/"]["get"]["responses"]["200"];
        assert!(text.get("content").is_none());
    }

    #[test]
    fn document_is_generated_once() {
        let doc = VersionedDocument::new(
            OpenApiSpec::new("Test", "1.0.0"),
            fixture_routes(),
            Some(VersioningConfig::new(VENDOR)),
        );
        assert!(!doc.is_generated());

        let first = doc.document() as *const Value;
        let second = doc.document() as *const Value;
        assert!(doc.is_generated());
        assert_eq!(first, second);
    }

    #[test]
    fn without_config_versions_collapse() {
        let doc = VersionedDocument::new(OpenApiSpec::new("Test", "1.0.0"), fixture_routes(), None);
        let test = doc.document()["paths"]["/test/"].as_object().unwrap();
        let get_content = test["get"]["responses"]["200"]["content"].as_object().unwrap();
        let keys: Vec<&str> = get_content.keys().map(String::as_str).collect();
        assert_eq!(keys, ["application/json"]);
        assert_eq!(test["post"]["requestBody"]["content"].as_object().unwrap().len(), 1);
    }
}
