//! OpenAPI specification types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API information for OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI specification builder
///
/// Paths and schemas are kept in ordered maps so that the generated document
/// is byte-for-byte stable between builds.
#[derive(Debug, Clone)]
pub struct OpenApiSpec {
    pub info: ApiInfo,
    pub paths: BTreeMap<String, PathItem>,
    pub schemas: BTreeMap<String, serde_json::Value>,
}

/// Path item in OpenAPI spec
///
/// Operations are keyed by the lower-cased HTTP method, so custom methods
/// are carried through as well as the standard ones.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathItem {
    #[serde(flatten)]
    pub operations: BTreeMap<String, Operation>,
}

impl PathItem {
    /// Get the operation registered for a method, if any
    pub fn operation(&self, method: &str) -> Option<&Operation> {
        self.operations.get(&method.to_ascii_lowercase())
    }
}

/// Operation (endpoint) in OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, ResponseSpec>,
    /// Component schemas referenced by this operation, moved into
    /// `components/schemas` when the operation is added to a spec
    #[serde(skip)]
    pub schemas: BTreeMap<String, serde_json::Value>,
}

/// Parameter in OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: SchemaRef,
}

/// Request body in OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

/// Media type in OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: SchemaRef,
}

/// Response specification
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResponseSpec {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// Schema reference or inline schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(serde_json::Value),
}

impl SchemaRef {
    /// Reference a schema registered under `#/components/schemas`
    pub fn component(name: &str) -> Self {
        Self::Ref {
            reference: format!("#/components/schemas/{}", name),
        }
    }
}

impl OpenApiSpec {
    /// Create a new OpenAPI specification
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ApiInfo {
                title: title.into(),
                version: version.into(),
                description: None,
            },
            paths: BTreeMap::new(),
            schemas: BTreeMap::new(),
        }
    }

    /// Set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.info.description = Some(desc.into());
        self
    }

    /// Add a path operation
    ///
    /// A second operation for the same path and method replaces the first;
    /// callers that need both must give them distinct path keys.
    pub fn path(mut self, path: &str, method: &str, operation: Operation) -> Self {
        self.add_operation(path, method, operation);
        self
    }

    /// Add a path operation in place
    pub fn add_operation(&mut self, path: &str, method: &str, mut operation: Operation) {
        for (name, schema) in std::mem::take(&mut operation.schemas) {
            self.schemas.entry(name).or_insert(schema);
        }
        self.paths
            .entry(path.to_string())
            .or_default()
            .operations
            .insert(method.to_ascii_lowercase(), operation);
    }

    /// Add a schema definition
    pub fn schema(mut self, name: &str, schema: serde_json::Value) -> Self {
        self.schemas.insert(name.to_string(), schema);
        self
    }

    /// Register a type that implements Schema (utoipa::ToSchema)
    pub fn register<T: for<'a> utoipa::ToSchema<'a>>(mut self) -> Self {
        self.register_in_place::<T>();
        self
    }

    /// Register a schema type in place
    pub fn register_in_place<T: for<'a> utoipa::ToSchema<'a>>(&mut self) {
        let (name, schema) = T::schema();
        if let Ok(json_schema) = serde_json::to_value(schema) {
            self.schemas.insert(name.to_string(), json_schema);
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> serde_json::Value {
        let mut spec = serde_json::json!({
            "openapi": "3.0.3",
            "info": self.info,
            "paths": self.paths,
        });

        if !self.schemas.is_empty() {
            spec["components"] = serde_json::json!({
                "schemas": self.schemas
            });
        }

        spec
    }
}

impl Operation {
    /// Create a new operation
    pub fn new() -> Self {
        Self {
            summary: None,
            description: None,
            tags: None,
            parameters: None,
            request_body: None,
            responses: BTreeMap::from([(
                "200".to_string(),
                ResponseSpec {
                    description: "Successful response".to_string(),
                    content: None,
                },
            )]),
            schemas: BTreeMap::new(),
        }
    }

    /// Set summary
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Add tags
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Reference the component schema of `T`, recording its definition so
    /// the generated document carries it under `components/schemas`.
    pub fn schema_ref<T: for<'a> utoipa::ToSchema<'a>>(&mut self) -> SchemaRef {
        let (name, schema) = T::schema();
        if let Ok(json_schema) = serde_json::to_value(schema) {
            self.schemas.insert(name.to_string(), json_schema);
        }
        SchemaRef::component(name)
    }

    /// Re-key the `application/json` content of the `200` response to
    /// `media_type`. Other media types are served unchanged and stay as they
    /// are.
    pub fn set_success_media_type(&mut self, media_type: &str) {
        let Some(content) = self
            .responses
            .get_mut("200")
            .and_then(|response| response.content.as_mut())
        else {
            return;
        };
        if let Some(json) = content.remove("application/json") {
            content.insert(media_type.to_string(), json);
        }
    }
}

impl Default for Operation {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for types that can modify an OpenAPI operation
///
/// This is used by extractors to automatically update the operation
/// documentation (e.g. adding request body schema, parameters, etc.)
pub trait OperationModifier {
    /// Update the operation
    fn update_operation(op: &mut Operation);
}

// Implement for Option<T>
impl<T: OperationModifier> OperationModifier for Option<T> {
    fn update_operation(op: &mut Operation) {
        T::update_operation(op);
        // If request body was added, make it optional
        if let Some(body) = &mut op.request_body {
            body.required = false;
        }
    }
}

// Implement for Result<T, E>
impl<T: OperationModifier, E> OperationModifier for std::result::Result<T, E> {
    fn update_operation(op: &mut Operation) {
        T::update_operation(op);
    }
}

/// Trait for types that describe the responses they produce
pub trait ResponseModifier {
    /// Update the operation with response information
    fn update_response(op: &mut Operation);
}

// Implement for () - 200 OK (empty)
impl ResponseModifier for () {
    fn update_response(op: &mut Operation) {
        let response = ResponseSpec {
            description: "Successful response".to_string(),
            ..Default::default()
        };
        op.responses.insert("200".to_string(), response);
    }
}

fn text_response() -> ResponseSpec {
    ResponseSpec {
        description: "Successful response".to_string(),
        content: Some(BTreeMap::from([(
            "text/plain".to_string(),
            MediaType {
                schema: SchemaRef::Inline(serde_json::json!({ "type": "string" })),
            },
        )])),
    }
}

// Implement for String - 200 OK (text/plain)
impl ResponseModifier for String {
    fn update_response(op: &mut Operation) {
        op.responses.insert("200".to_string(), text_response());
    }
}

// Implement for &'static str - 200 OK (text/plain)
impl ResponseModifier for &'static str {
    fn update_response(op: &mut Operation) {
        op.responses.insert("200".to_string(), text_response());
    }
}

// Implement for Option<T> - Delegates to T
impl<T: ResponseModifier> ResponseModifier for Option<T> {
    fn update_response(op: &mut Operation) {
        T::update_response(op);
    }
}

// Implement for Result<T, E> - Delegates to T (success) and E (error)
impl<T: ResponseModifier, E: ResponseModifier> ResponseModifier for Result<T, E> {
    fn update_response(op: &mut Operation) {
        T::update_response(op);
        E::update_response(op);
    }
}

// Implement for http::Response<T> - Generic 200 OK
impl<T> ResponseModifier for http::Response<T> {
    fn update_response(op: &mut Operation) {
        op.responses.insert(
            "200".to_string(),
            ResponseSpec {
                description: "Successful response".to_string(),
                ..Default::default()
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_are_keyed_by_lowercase_method() {
        let spec = OpenApiSpec::new("Test", "1.0.0")
            .path("/items", "GET", Operation::new())
            .path("/items", "PURGE", Operation::new());

        let item = &spec.paths["/items"];
        assert!(item.operation("get").is_some());
        assert!(item.operation("PURGE").is_some());

        let json = spec.to_json();
        let methods = json["paths"]["/items"].as_object().unwrap();
        assert_eq!(methods.len(), 2);
        assert!(methods.contains_key("purge"));
    }

    #[test]
    fn same_path_and_method_collapses_to_one_operation() {
        let spec = OpenApiSpec::new("Test", "1.0.0")
            .path("/items", "get", Operation::new().summary("first"))
            .path("/items", "get", Operation::new().summary("second"));

        let op = spec.paths["/items"].operation("get").unwrap();
        assert_eq!(op.summary.as_deref(), Some("second"));
    }

    #[test]
    fn success_media_type_keeps_existing_schema() {
        let mut op = Operation::new();
        op.responses.insert(
            "200".to_string(),
            ResponseSpec {
                description: "ok".to_string(),
                content: Some(BTreeMap::from([(
                    "application/json".to_string(),
                    MediaType {
                        schema: SchemaRef::component("Item"),
                    },
                )])),
            },
        );

        op.set_success_media_type("application/vnd.acme+json; version=2.0");

        let content = op.responses["200"].content.as_ref().unwrap();
        assert_eq!(content.len(), 1);
        let media = &content["application/vnd.acme+json; version=2.0"];
        assert!(matches!(
            &media.schema,
            SchemaRef::Ref { reference } if reference == "#/components/schemas/Item"
        ));
    }

    #[test]
    fn success_media_type_leaves_other_content_alone() {
        let mut op = Operation::new();
        op.set_success_media_type("application/vnd.acme+json; version=2.0");
        assert!(op.responses["200"].content.is_none());

        op.responses.get_mut("200").unwrap().content = Some(BTreeMap::from([(
            "text/plain".to_string(),
            MediaType {
                schema: SchemaRef::Inline(serde_json::json!({ "type": "string" })),
            },
        )]));
        op.set_success_media_type("application/vnd.acme+json; version=2.0");

        let content = op.responses["200"].content.as_ref().unwrap();
        let keys: Vec<&str> = content.keys().map(String::as_str).collect();
        assert_eq!(keys, ["text/plain"]);
    }

    #[test]
    fn operation_schemas_are_hoisted_into_components() {
        let mut op = Operation::new();
        op.schemas
            .insert("Item".to_string(), serde_json::json!({ "type": "object" }));

        let spec = OpenApiSpec::new("Test", "1.0.0").path("/items", "get", op);
        assert!(spec.paths["/items"].operation("get").unwrap().schemas.is_empty());
        assert_eq!(spec.to_json()["components"]["schemas"]["Item"]["type"], "object");
    }

    #[test]
    fn schemas_appear_under_components() {
        let spec = OpenApiSpec::new("Test", "1.0.0")
            .schema("Thing", serde_json::json!({ "type": "object" }));
        let json = spec.to_json();
        assert_eq!(json["components"]["schemas"]["Thing"]["type"], "object");
        assert_eq!(json["openapi"], "3.0.3");
    }
}
