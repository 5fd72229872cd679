//! Folding per-version operations back into one path entry
//!
//! The generator keys every operation by `(path, method)`, so two versions of
//! the same endpoint would overwrite each other. Versioned operations are
//! therefore registered under a synthetic path `<path>:<version>` and this
//! module folds the synthetic paths back into their real path once the
//! document has been generated.

use super::version::ApiVersion;
use serde_json::{Map, Value};
use tracing::trace;

/// Separator between the real path and the version in a synthetic path
pub const VERSION_SEPARATOR: char = ':';

/// Synthetic path a versioned operation is registered under
pub fn synthetic_path(path: &str, version: ApiVersion) -> String {
    format!("{}{}{}", path, VERSION_SEPARATOR, version)
}

/// Split a synthetic path into the real path and its version.
///
/// Returns `None` for ordinary paths, including paths that contain the
/// separator without a `major.minor` suffix.
pub fn split_synthetic_path(path: &str) -> Option<(&str, ApiVersion)> {
    let (real, version) = path.rsplit_once(VERSION_SEPARATOR)?;
    let version = version.parse().ok()?;
    Some((real, version))
}

/// Fold synthetic versioned paths of an OpenAPI document into real paths.
///
/// Request bodies of versioned operations are re-keyed to the vendor media
/// type of their version. Operations that end up on the same real path are
/// deep-merged; on conflicting leaves the first value wins.
pub fn merge_versioned_paths(document: &mut Value, vendor_media_type: &str) {
    let Some(paths) = document.get_mut("paths").and_then(Value::as_object_mut) else {
        return;
    };

    let mut merged: Map<String, Value> = Map::new();
    for (raw_path, mut methods) in std::mem::take(paths) {
        let real_path = match split_synthetic_path(&raw_path) {
            Some((real_path, version)) => {
                tag_request_bodies(&mut methods, &version.media_type(vendor_media_type));
                real_path.to_string()
            }
            None => raw_path,
        };

        match merged.get_mut(&real_path) {
            Some(existing) => {
                trace!(path = %real_path, "merging versioned operations");
                deep_merge(existing, methods);
            }
            None => {
                merged.insert(real_path, methods);
            }
        }
    }

    *paths = merged;
}

/// Re-key the request body content of every operation to `media_type`.
fn tag_request_bodies(methods: &mut Value, media_type: &str) {
    let Some(methods) = methods.as_object_mut() else {
        return;
    };

    for operation in methods.values_mut() {
        let Some(content) = operation
            .get_mut("requestBody")
            .and_then(|body| body.get_mut("content"))
            .and_then(Value::as_object_mut)
        else {
            continue;
        };

        let retagged: Map<String, Value> = std::mem::take(content)
            .into_iter()
            .map(|(_, schema)| (media_type.to_string(), schema))
            .collect();
        *content = retagged;
    }
}

/// Merge `incoming` into `existing` key by key.
///
/// Keys missing from `existing` are added, objects present on both sides are
/// merged recursively, and any other conflict keeps the existing value.
pub fn deep_merge(existing: &mut Value, incoming: Value) {
    let (Some(existing), Value::Object(incoming)) = (existing.as_object_mut(), incoming) else {
        return;
    };

    for (key, value) in incoming {
        match existing.get_mut(&key) {
            Some(current) if current.is_object() && value.is_object() => deep_merge(current, value),
            Some(_) => {}
            None => {
                existing.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const VENDOR: &str = "application/vnd.some.name+json";

    #[test]
    fn synthetic_path_round_trips() {
        let path = synthetic_path("/test/", ApiVersion::new(2, 0));
        assert_eq!(path, "/test/:2.0");
        assert_eq!(split_synthetic_path(&path), Some(("/test/", ApiVersion::new(2, 0))));
    }

    #[test]
    fn ordinary_paths_are_not_split() {
        assert_eq!(split_synthetic_path("/simple/"), None);
        assert_eq!(split_synthetic_path("/time/12:30"), None);
    }

    #[test]
    fn deep_merge_adds_missing_keys_and_keeps_existing_leaves() {
        let mut existing = json!({ "a": { "x": 1 }, "b": "first" });
        deep_merge(&mut existing, json!({ "a": { "y": 2 }, "b": "second", "c": true }));
        assert_eq!(existing, json!({ "a": { "x": 1, "y": 2 }, "b": "first", "c": true }));
    }

    #[test]
    fn deep_merge_keeps_existing_when_shapes_differ() {
        let mut existing = json!({ "a": { "x": 1 } });
        deep_merge(&mut existing, json!({ "a": "scalar" }));
        assert_eq!(existing, json!({ "a": { "x": 1 } }));
    }

    #[test]
    fn versions_fold_into_one_path() {
        let mut document = json!({
            "paths": {
                "/test/:1.0": {
                    "get": { "responses": { "200": { "content": {
                        "application/vnd.some.name+json; version=1.0": { "schema": {} }
                    } } } },
                    "post": {
                        "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Body" } } } },
                        "responses": { "200": { "content": {
                            "application/vnd.some.name+json; version=1.0": { "schema": {} }
                        } } }
                    }
                },
                "/test/:1.1": {
                    "post": {
                        "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Body2" } } } },
                        "responses": { "200": { "content": {
                            "application/vnd.some.name+json; version=1.1": { "schema": {} }
                        } } }
                    }
                },
                "/test/:2.0": {
                    "get": { "responses": { "200": { "content": {
                        "application/vnd.some.name+json; version=2.0": { "schema": {} }
                    } } } }
                },
                "/simple/": { "get": { "responses": { "200": { "description": "ok" } } } }
            }
        });

        merge_versioned_paths(&mut document, VENDOR);

        let paths = document["paths"].as_object().unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.contains_key("/simple/"));

        let test = paths["/test/"].as_object().unwrap();
        assert_eq!(test.len(), 2);
        assert_eq!(test["get"]["responses"]["200"]["content"].as_object().unwrap().len(), 2);
        assert_eq!(test["post"]["responses"]["200"]["content"].as_object().unwrap().len(), 2);

        let body = test["post"]["requestBody"]["content"].as_object().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(
            body["application/vnd.some.name+json; version=1.0"]["schema"]["$ref"],
            "#/components/schemas/Body"
        );
        assert_eq!(
            body["application/vnd.some.name+json; version=1.1"]["schema"]["$ref"],
            "#/components/schemas/Body2"
        );
    }

    #[test]
    fn document_without_paths_is_left_alone() {
        let mut document = json!({ "openapi": "3.0.3" });
        merge_versioned_paths(&mut document, VENDOR);
        assert_eq!(document, json!({ "openapi": "3.0.3" }));
    }

    proptest! {
        #[test]
        fn prop_merge_keeps_one_content_entry_per_version(
            versions in proptest::collection::btree_set((0u32..10, 0u32..10), 1..6)
        ) {
            let mut paths = Map::new();
            for (major, minor) in &versions {
                let version = ApiVersion::new(*major, *minor);
                paths.insert(
                    synthetic_path("/items/{id}", version),
                    json!({ "put": {
                        "requestBody": { "content": { "application/json": { "schema": {} } } },
                        "responses": { "200": { "content": { version.media_type(VENDOR): { "schema": {} } } } }
                    } }),
                );
            }
            let mut document = json!({ "paths": paths });

            merge_versioned_paths(&mut document, VENDOR);

            let put = &document["paths"]["/items/{id}"]["put"];
            prop_assert_eq!(document["paths"].as_object().unwrap().len(), 1);
            prop_assert_eq!(put["responses"]["200"]["content"].as_object().unwrap().len(), versions.len());
            prop_assert_eq!(put["requestBody"]["content"].as_object().unwrap().len(), versions.len());
        }
    }
}
