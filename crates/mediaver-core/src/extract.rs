//! Extractors for Mediaver
//!
//! Extractors automatically parse data from incoming requests and describe
//! what they read in the OpenAPI operation of the handler.

use crate::error::{ApiError, Result};
use crate::request::Request;
use bytes::Bytes;
use mediaver_openapi::versioning::{ApiVersion, DEFAULT_VERSION};
use mediaver_openapi::{MediaType, Operation, OperationModifier, RequestBody, Schema, SchemaRef};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::future::Future;
use std::ops::Deref;
use std::str::FromStr;

/// Trait for extracting data from request parts (headers, path, query)
///
/// This is used for extractors that don't need the request body.
pub trait FromRequestParts: Sized {
    /// Extract from request parts
    fn from_request_parts(req: &Request) -> Result<Self>;
}

/// Trait for extracting data from the full request (including body)
///
/// This is used for extractors that consume the request body.
pub trait FromRequest: Sized {
    /// Extract from the full request
    fn from_request(req: &mut Request) -> impl Future<Output = Result<Self>> + Send;
}

// Blanket impl: FromRequestParts -> FromRequest
impl<T: FromRequestParts> FromRequest for T {
    async fn from_request(req: &mut Request) -> Result<Self> {
        T::from_request_parts(req)
    }
}

/// JSON body extractor and response
///
/// As an argument it parses the request body into `T`; as a return value it
/// serializes `T` as `application/json`.
///
/// ```rust,ignore
/// #[derive(Deserialize, Serialize, Schema)]
/// struct Item {
///     name: String,
/// }
///
/// async fn echo(Json(item): Json<Item>) -> Json<Item> {
///     Json(item)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned + Send> FromRequest for Json<T> {
    async fn from_request(req: &mut Request) -> Result<Self> {
        let body = req
            .take_body()
            .ok_or_else(|| ApiError::internal("Body already consumed"))?;

        let value: T = serde_json::from_slice(&body)?;
        Ok(Json(value))
    }
}

impl<T: for<'a> Schema<'a>> OperationModifier for Json<T> {
    fn update_operation(op: &mut Operation) {
        let schema = op.schema_ref::<T>();
        op.request_body = Some(RequestBody {
            required: true,
            content: BTreeMap::from([("application/json".to_string(), MediaType { schema })]),
        });
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Query string extractor
///
/// Parses the query string into type `T`.
#[derive(Debug, Clone)]
pub struct Query<T>(pub T);

impl<T: DeserializeOwned> FromRequestParts for Query<T> {
    fn from_request_parts(req: &Request) -> Result<Self> {
        let query = req.query_string().unwrap_or("");
        let value: T = serde_urlencoded::from_str(query)
            .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e)))?;
        Ok(Query(value))
    }
}

impl<T> OperationModifier for Query<T> {
    fn update_operation(_op: &mut Operation) {}
}

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Path parameter extractor
///
/// Extracts the path parameter of a route pattern such as `/items/{id}`.
/// Path parameters are documented from the route pattern itself.
#[derive(Debug, Clone)]
pub struct Path<T>(pub T);

impl<T: FromStr> FromRequestParts for Path<T>
where
    T::Err: std::fmt::Display,
{
    fn from_request_parts(req: &Request) -> Result<Self> {
        let (_, value) = req
            .path_params()
            .iter()
            .next()
            .ok_or_else(|| ApiError::internal("Missing path parameter"))?;

        value
            .parse::<T>()
            .map(Path)
            .map_err(|e| ApiError::bad_request(format!("Invalid path parameter: {}", e)))
    }
}

impl<T> OperationModifier for Path<T> {
    fn update_operation(_op: &mut Operation) {}
}

impl<T> Deref for Path<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// State extractor
///
/// Extracts shared application state registered with `.state()`.
#[derive(Debug, Clone)]
pub struct State<T>(pub T);

impl<T: Clone + Send + Sync + 'static> FromRequestParts for State<T> {
    fn from_request_parts(req: &Request) -> Result<Self> {
        req.state().get::<T>().cloned().map(State).ok_or_else(|| {
            ApiError::internal(format!(
                "State of type `{}` not found. Did you forget to call .state()?",
                std::any::type_name::<T>()
            ))
        })
    }
}

impl<T> OperationModifier for State<T> {
    fn update_operation(_op: &mut Operation) {}
}

impl<T> Deref for State<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Raw body bytes extractor
#[derive(Debug, Clone)]
pub struct Body(pub Bytes);

impl FromRequest for Body {
    async fn from_request(req: &mut Request) -> Result<Self> {
        let body = req
            .take_body()
            .ok_or_else(|| ApiError::internal("Body already consumed"))?;
        Ok(Body(body))
    }
}

impl OperationModifier for Body {
    fn update_operation(op: &mut Operation) {
        op.request_body = Some(RequestBody {
            required: true,
            content: BTreeMap::from([(
                "application/octet-stream".to_string(),
                MediaType {
                    schema: SchemaRef::Inline(
                        serde_json::json!({ "type": "string", "format": "binary" }),
                    ),
                },
            )]),
        });
    }
}

impl Deref for Body {
    type Target = Bytes;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// API version negotiated for the current request
///
/// Inserted into the request extensions by the negotiation middleware when
/// the `Accept` header names a version. As an extractor it yields the
/// negotiated version, or [`DEFAULT_VERSION`] when the client did not ask
/// for one.
///
/// ```rust,ignore
/// async fn whoami(NegotiatedVersion(version): NegotiatedVersion) -> String {
///     format!("served by {}", version)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedVersion(pub ApiVersion);

impl FromRequestParts for NegotiatedVersion {
    fn from_request_parts(req: &Request) -> Result<Self> {
        Ok(NegotiatedVersion(
            req.negotiated_version().unwrap_or(DEFAULT_VERSION),
        ))
    }
}

impl OperationModifier for NegotiatedVersion {
    fn update_operation(_op: &mut Operation) {}
}

/// Optional extractor wrapper
///
/// Makes any extractor optional - returns None instead of error on failure.
impl<T: FromRequestParts> FromRequestParts for Option<T> {
    fn from_request_parts(req: &Request) -> Result<Self> {
        Ok(T::from_request_parts(req).ok())
    }
}
