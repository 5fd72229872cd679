//! Router implementation using radix tree (matchit)
//!
//! Routes are registered with path patterns and per-method handlers. A path
//! and method may carry several handlers as long as each serves a different
//! API version.
//!
//! # Path Patterns
//!
//! - `/items` - Static path
//! - `/items/{id}` - Single parameter
//! - `/users/{user_id}/items/{item_id}` - Multiple parameters
//!
//! # Versioned Routes
//!
//! ```rust,ignore
//! let router = Router::new()
//!     .route("/items", get(list_items_v1).version((1, 0)))
//!     .route("/items", get(list_items_v2).version((2, 0)))
//!     .route("/health", get(health));
//! ```
//!
//! A request reaches a versioned handler only when its negotiated version
//! (or the default version, if it did not negotiate one) equals the
//! handler's tag. A path that exists but has no handler for the method and
//! version answers `405 Method Not Allowed`. Unversioned handlers serve
//! every version.
//!
//! # Route Conflict Detection
//!
//! Conflicting path patterns, duplicate versions of a handler and mixing
//! versioned with unversioned handlers on the same path and method are
//! programming errors and panic at registration time.

use crate::handler::{into_boxed_handler, BoxedHandler, Handler};
use http::{Extensions, Method};
use matchit::Router as MatchitRouter;
use mediaver_openapi::versioning::{ApiVersion, RouteOperation, DEFAULT_VERSION};
use mediaver_openapi::{Operation, Parameter, SchemaRef};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Error raised when two routes cannot share the route table
#[derive(Debug, Clone)]
pub struct RouteConflictError {
    /// The path that was being registered
    pub new_path: String,
    /// The existing path that conflicts
    pub existing_path: String,
    /// Detailed error message from the underlying router
    pub details: String,
}

impl std::fmt::Display for RouteConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ROUTE CONFLICT DETECTED")?;
        writeln!(f, "  Conflicting routes:")?;
        writeln!(f, "    → Existing: {}", self.existing_path)?;
        writeln!(f, "    → New:      {}", self.new_path)?;
        writeln!(f, "  Details: {}", self.details)?;
        writeln!(f)?;
        writeln!(f, "  Register every version of an endpoint under the same path pattern,")?;
        writeln!(f, "  with the same parameter names, and tag each with its own version.")
    }
}

impl std::error::Error for RouteConflictError {}

/// Error raised when an endpoint cannot join a method router
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointConflict {
    /// Two handlers for the same method and version
    #[error("duplicate {method} handler for version {version}")]
    DuplicateVersion { method: Method, version: ApiVersion },
    /// Two unversioned handlers for the same method
    #[error("duplicate {method} handler")]
    DuplicateHandler { method: Method },
    /// A versioned and an unversioned handler for the same method
    #[error("{method} mixes versioned and unversioned handlers")]
    MixedVersioning { method: Method },
}

/// A registered handler together with its documentation and version tag
#[derive(Clone)]
pub(crate) struct Endpoint {
    pub(crate) handler: BoxedHandler,
    pub(crate) operation: Operation,
    pub(crate) version: Option<ApiVersion>,
}

impl Endpoint {
    /// Whether this endpoint serves a request that negotiated `negotiated`
    pub(crate) fn accepts(&self, negotiated: Option<ApiVersion>) -> bool {
        match self.version {
            None => true,
            Some(version) => negotiated.unwrap_or(DEFAULT_VERSION) == version,
        }
    }
}

/// HTTP method router for a single path
#[derive(Clone, Default)]
pub struct MethodRouter {
    endpoints: Vec<(Method, Endpoint)>,
}

impl MethodRouter {
    /// Create a new empty method router
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler for `method`
    ///
    /// # Panics
    ///
    /// Panics if the method already has a handler for the same version, or
    /// if versioned and unversioned handlers would be mixed.
    pub fn on<H, T>(mut self, method: Method, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        let mut operation = Operation::new();
        H::update_operation(&mut operation);
        let endpoint = Endpoint {
            version: handler.version_tag(),
            handler: into_boxed_handler(handler),
            operation,
        };

        if let Err(conflict) = self.insert(method, endpoint) {
            panic!("Route conflict: {}", conflict);
        }
        self
    }

    /// Add a GET handler
    pub fn get<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::GET, handler)
    }

    /// Add a POST handler
    pub fn post<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::POST, handler)
    }

    /// Add a PUT handler
    pub fn put<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::PUT, handler)
    }

    /// Add a PATCH handler
    pub fn patch<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::PATCH, handler)
    }

    /// Add a DELETE handler
    pub fn delete<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::DELETE, handler)
    }

    /// Tag every handler of this method router with `version`
    ///
    /// Replaces any previous tag.
    ///
    /// # Panics
    ///
    /// Panics if retagging makes two handlers of the same method collide.
    pub fn version(self, version: impl Into<ApiVersion>) -> Self {
        let version = version.into();
        self.retag(|_| Some(version))
    }

    /// Give untagged handlers the default version
    pub(crate) fn with_default_version(self) -> Self {
        self.retag(|tag| Some(tag.unwrap_or(DEFAULT_VERSION)))
    }

    fn retag(self, tag: impl Fn(Option<ApiVersion>) -> Option<ApiVersion>) -> Self {
        let mut retagged = MethodRouter::new();
        for (method, mut endpoint) in self.endpoints {
            endpoint.version = tag(endpoint.version);
            if let Err(conflict) = retagged.insert(method, endpoint) {
                panic!("Route conflict: {}", conflict);
            }
        }
        retagged
    }

    /// Insert an endpoint, enforcing one handler per method and version
    pub(crate) fn insert(
        &mut self,
        method: Method,
        endpoint: Endpoint,
    ) -> Result<(), EndpointConflict> {
        let conflict = self.endpoints_for(&method).find_map(|existing| {
            match (existing.version, endpoint.version) {
                (Some(a), Some(b)) if a == b => Some(EndpointConflict::DuplicateVersion {
                    method: method.clone(),
                    version: a,
                }),
                (None, None) => Some(EndpointConflict::DuplicateHandler {
                    method: method.clone(),
                }),
                (Some(_), None) | (None, Some(_)) => Some(EndpointConflict::MixedVersioning {
                    method: method.clone(),
                }),
                _ => None,
            }
        });
        if let Some(conflict) = conflict {
            return Err(conflict);
        }

        self.endpoints.push((method, endpoint));
        Ok(())
    }

    /// Endpoints registered for `method`, in registration order
    pub(crate) fn endpoints_for(&self, method: &Method) -> impl Iterator<Item = &Endpoint> + '_ {
        let method = method.clone();
        self.endpoints
            .iter()
            .filter(move |(m, _)| *m == method)
            .map(|(_, endpoint)| endpoint)
    }

    /// Methods with at least one handler, for the `Allow` header
    pub(crate) fn allowed_methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for (method, _) in &self.endpoints {
            if !methods.contains(method) {
                methods.push(method.clone());
            }
        }
        methods
    }

    fn is_versioned(&self) -> bool {
        self.endpoints
            .iter()
            .any(|(_, endpoint)| endpoint.version.is_some())
    }
}

/// Create a method router with a handler for `method`
pub fn on<H, T>(method: Method, handler: H) -> MethodRouter
where
    H: Handler<T>,
    T: 'static,
{
    MethodRouter::new().on(method, handler)
}

/// Create a GET route handler
pub fn get<H, T>(handler: H) -> MethodRouter
where
    H: Handler<T>,
    T: 'static,
{
    MethodRouter::new().on(Method::GET, handler)
}

/// Create a POST route handler
pub fn post<H, T>(handler: H) -> MethodRouter
where
    H: Handler<T>,
    T: 'static,
{
    MethodRouter::new().on(Method::POST, handler)
}

/// Create a PUT route handler
pub fn put<H, T>(handler: H) -> MethodRouter
where
    H: Handler<T>,
    T: 'static,
{
    MethodRouter::new().on(Method::PUT, handler)
}

/// Create a PATCH route handler
pub fn patch<H, T>(handler: H) -> MethodRouter
where
    H: Handler<T>,
    T: 'static,
{
    MethodRouter::new().on(Method::PATCH, handler)
}

/// Create a DELETE route handler
pub fn delete<H, T>(handler: H) -> MethodRouter
where
    H: Handler<T>,
    T: 'static,
{
    MethodRouter::new().on(Method::DELETE, handler)
}

struct RouteEntry {
    path: String,
    methods: MethodRouter,
}

/// Main router
pub struct Router {
    inner: MatchitRouter<usize>,
    routes: Vec<RouteEntry>,
    /// Route index by matchit path, so repeated registrations merge
    by_path: HashMap<String, usize>,
    state: Arc<Extensions>,
}

impl Router {
    /// Create a new router
    pub fn new() -> Self {
        Self {
            inner: MatchitRouter::new(),
            routes: Vec::new(),
            by_path: HashMap::new(),
            state: Arc::new(Extensions::new()),
        }
    }

    /// Add a route
    ///
    /// Registering the same path again adds the new handlers to the
    /// existing ones.
    ///
    /// # Panics
    ///
    /// Panics on a conflicting path pattern or a conflicting handler.
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.add_route(path, method_router);
        self
    }

    fn add_route(&mut self, path: &str, method_router: MethodRouter) {
        let matchit_path = convert_path_params(path);

        if let Some(&index) = self.by_path.get(&matchit_path) {
            let entry = &mut self.routes[index];
            for (method, endpoint) in method_router.endpoints {
                if let Err(conflict) = entry.methods.insert(method, endpoint) {
                    panic!("Route conflict on `{}`: {}", path, conflict);
                }
            }
            return;
        }

        let index = self.routes.len();
        if let Err(e) = self.inner.insert(matchit_path.clone(), index) {
            let normalized = normalize_path_for_comparison(&matchit_path);
            let existing_path = self
                .routes
                .iter()
                .find(|entry| {
                    normalize_path_for_comparison(&convert_path_params(&entry.path)) == normalized
                })
                .map(|entry| entry.path.clone())
                .unwrap_or_else(|| "<unknown>".to_string());

            let conflict_error = RouteConflictError {
                new_path: path.to_string(),
                existing_path,
                details: e.to_string(),
            };
            panic!("{}", conflict_error);
        }

        self.by_path.insert(matchit_path, index);
        self.routes.push(RouteEntry {
            path: path.to_string(),
            methods: method_router,
        });
    }

    /// Add every route of `other` to this router
    ///
    /// State registered on `other` is not carried over.
    pub fn merge(mut self, other: Router) -> Self {
        for entry in other.routes {
            self.add_route(&entry.path, entry.methods);
        }
        self
    }

    /// Add application state
    pub fn state<S: Clone + Send + Sync + 'static>(mut self, state: S) -> Self {
        Arc::make_mut(&mut self.state).insert(state);
        self
    }

    /// Whether any handler carries a version tag
    pub fn has_versioned_routes(&self) -> bool {
        self.routes.iter().any(|entry| entry.methods.is_versioned())
    }

    /// Registered path patterns, in registration order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|entry| entry.path.as_str())
    }

    /// Match a request against the route table.
    ///
    /// `negotiated` is the version the request negotiated, `None` when it
    /// did not ask for one.
    pub(crate) fn match_route(
        &self,
        path: &str,
        method: &Method,
        negotiated: Option<ApiVersion>,
    ) -> RouteMatch<'_> {
        let matched = match self.inner.at(path) {
            Ok(matched) => matched,
            Err(_) => return RouteMatch::NotFound,
        };

        let entry = &self.routes[*matched.value];
        let found = entry
            .methods
            .endpoints_for(method)
            .find(|endpoint| endpoint.accepts(negotiated));

        match found {
            Some(endpoint) => RouteMatch::Found {
                endpoint,
                params: matched
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            None => RouteMatch::MethodNotAllowed {
                allowed: entry.methods.allowed_methods(),
            },
        }
    }

    /// OpenAPI operations of every registered handler
    pub(crate) fn operations(&self) -> Vec<RouteOperation> {
        let mut operations = Vec::new();
        for entry in &self.routes {
            for (method, endpoint) in &entry.methods.endpoints {
                let mut operation = endpoint.operation.clone();
                add_path_params_to_operation(&entry.path, &mut operation);
                operations.push(RouteOperation {
                    path: entry.path.clone(),
                    method: method.as_str().to_string(),
                    version: endpoint.version,
                    operation,
                });
            }
        }
        operations
    }

    /// Get shared state
    pub(crate) fn state_ref(&self) -> Arc<Extensions> {
        self.state.clone()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Router whose handlers all serve an explicit API version
///
/// Handlers registered without a tag serve [`DEFAULT_VERSION`].
///
/// ```rust,ignore
/// let items = VersionedRouter::new()
///     .route("/items", get(list_items_v1))                     // 1.0
///     .route("/items", get(versioned((2, 0), list_items_v2)));  // 2.0
///
/// Mediaver::new().include(items)
/// ```
#[derive(Default)]
pub struct VersionedRouter {
    router: Router,
}

impl VersionedRouter {
    /// Create an empty versioned router
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route, tagging untagged handlers with the default version
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.router = self
            .router
            .route(path, method_router.with_default_version());
        self
    }
}

impl From<VersionedRouter> for Router {
    fn from(versioned: VersionedRouter) -> Self {
        versioned.router
    }
}

/// Result of route matching
pub(crate) enum RouteMatch<'a> {
    Found {
        endpoint: &'a Endpoint,
        params: HashMap<String, String>,
    },
    NotFound,
    MethodNotAllowed {
        allowed: Vec<Method>,
    },
}

/// Convert {param} style to :param for matchit
fn convert_path_params(path: &str) -> String {
    let mut result = String::with_capacity(path.len());

    for ch in path.chars() {
        match ch {
            '{' => result.push(':'),
            '}' => {}
            _ => result.push(ch),
        }
    }

    result
}

/// Normalize a path for conflict comparison by replacing parameter names with a placeholder
fn normalize_path_for_comparison(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut in_param = false;

    for ch in path.chars() {
        match ch {
            ':' => {
                in_param = true;
                result.push_str(":_");
            }
            '/' => {
                in_param = false;
                result.push('/');
            }
            _ if in_param => {}
            _ => result.push(ch),
        }
    }

    result
}

/// Document `{param}` segments of `path` as required string path parameters
fn add_path_params_to_operation(path: &str, op: &mut Operation) {
    let names: Vec<&str> = path
        .split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        return;
    }

    let params = op.parameters.get_or_insert_with(Vec::new);
    for name in names {
        let already = params
            .iter()
            .any(|p| p.location == "path" && p.name == name);
        if already {
            continue;
        }

        params.push(Parameter {
            name: name.to_string(),
            location: "path".to_string(),
            required: true,
            description: None,
            schema: SchemaRef::Inline(serde_json::json!({ "type": "string" })),
        });
    }
}
