//! Mediaver application builder

use crate::config::MediaverSettings;
use crate::middleware::{LayerStack, MiddlewareLayer, VersionNegotiationLayer};
use crate::router::{get, MethodRouter, Router};
use crate::server::{Pipeline, Server};
use mediaver_openapi::versioning::{VersionedDocument, VersioningConfig};
use mediaver_openapi::{ErrorSchema, OpenApiConfig, OpenApiSpec};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main application builder for Mediaver
///
/// # Example
///
/// ```rust,ignore
/// use mediaver::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     Mediaver::new()
///         .versioning("application/vnd.acme+json")
///         .route("/items", get(versioned((1, 0), list_items)))
///         .route("/items", get(versioned((2, 0), list_items_v2)))
///         .route("/health", get(health))
///         .run("127.0.0.1:8080")
///         .await
/// }
/// ```
pub struct Mediaver {
    router: Router,
    openapi_spec: OpenApiSpec,
    openapi_config: OpenApiConfig,
    layers: LayerStack,
    versioning: Option<VersioningConfig>,
}

impl Mediaver {
    /// Create a new Mediaver application
    pub fn new() -> Self {
        let _ = tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,mediaver=debug")),
            )
            .with(tracing_subscriber::fmt::layer())
            .try_init();

        let openapi_config = OpenApiConfig::default();
        Self {
            router: Router::new(),
            openapi_spec: OpenApiSpec::new(&openapi_config.title, &openapi_config.version)
                .register::<ErrorSchema>(),
            openapi_config,
            layers: LayerStack::new(),
            versioning: None,
        }
    }

    /// Create an application configured from [`MediaverSettings`]
    ///
    /// Versioning is initialized when the settings name a vendor media type.
    pub fn from_settings(settings: MediaverSettings) -> Self {
        let mut app = Self::new();
        if let Some(title) = settings.title {
            app.openapi_config = std::mem::take(&mut app.openapi_config).title(title);
        }
        if let Some(path) = settings.docs_path {
            app = app.docs(&path);
        }
        if let Some(path) = settings.json_path {
            app = app.openapi_json_path(&path);
        }
        if let Some(vendor) = settings.vendor_media_type {
            app = app.versioning(&vendor);
        }
        app
    }

    /// Negotiate API versions with the vendor media type `vendor_media_type`
    ///
    /// # Panics
    ///
    /// Panics if versioning was already initialized.
    pub fn versioning(mut self, vendor_media_type: &str) -> Self {
        init_versioning(&mut self, vendor_media_type);
        self
    }

    /// The active versioning configuration, if versioning was initialized
    pub fn versioning_config(&self) -> Option<&VersioningConfig> {
        self.versioning.as_ref()
    }

    /// Add a middleware layer
    ///
    /// Layers run in the order they are added, after version negotiation and
    /// before routing.
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: MiddlewareLayer,
    {
        self.layers.push(Box::new(layer));
        self
    }

    /// Add application state, available to handlers through `State<T>`
    pub fn state<S>(mut self, state: S) -> Self
    where
        S: Clone + Send + Sync + 'static,
    {
        self.router = self.router.state(state);
        self
    }

    /// Add a route
    ///
    /// ```rust,ignore
    /// Mediaver::new()
    ///     .route("/items", get(list_items).version((2, 0)))
    /// ```
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.router = self.router.route(path, method_router);
        self
    }

    /// Add every route of a [`Router`] or [`VersionedRouter`](crate::VersionedRouter)
    pub fn include(mut self, router: impl Into<Router>) -> Self {
        self.router = self.router.merge(router.into());
        self
    }

    /// Register an OpenAPI schema
    pub fn register_schema<T: for<'a> mediaver_openapi::Schema<'a>>(mut self) -> Self {
        self.openapi_spec.register_in_place::<T>();
        self
    }

    /// Configure OpenAPI info (title, version, description)
    pub fn openapi_info(mut self, title: &str, version: &str, description: Option<&str>) -> Self {
        self.openapi_config = std::mem::take(&mut self.openapi_config).info(title, version, description);
        self
    }

    /// Serve the Swagger UI page at `path` (default `/docs`)
    pub fn docs(mut self, path: &str) -> Self {
        self.openapi_config = std::mem::take(&mut self.openapi_config).docs_path(path);
        self
    }

    /// Serve the OpenAPI document at `path` (default `/openapi.json`)
    pub fn openapi_json_path(mut self, path: &str) -> Self {
        self.openapi_config = std::mem::take(&mut self.openapi_config).json_path(path);
        self
    }

    /// Get the OpenAPI configuration
    pub fn openapi_config(&self) -> &OpenApiConfig {
        &self.openapi_config
    }

    /// Assemble the request pipeline
    ///
    /// # Panics
    ///
    /// Panics if versioned routes were registered without initializing
    /// versioning.
    pub(crate) fn build(self) -> Pipeline {
        let Self {
            router,
            mut openapi_spec,
            openapi_config,
            mut layers,
            versioning,
        } = self;

        if router.has_versioned_routes() && versioning.is_none() {
            panic!(
                "Versioned routes are registered but versioning is not initialized. \
                 Call `init_versioning(&mut app, vendor_media_type)` or \
                 `.versioning(vendor_media_type)` before running the app."
            );
        }

        openapi_spec.info = openapi_config.api_info();

        // Collected before the docs routes are added so they stay undocumented
        let operations = router.operations();
        info!(
            operations = operations.len(),
            versioned = versioning.is_some(),
            "Building Mediaver application"
        );

        let document = Arc::new(VersionedDocument::new(
            openapi_spec,
            operations,
            versioning.clone(),
        ));
        let router = mount_docs(router, &openapi_config, document);

        if let Some(config) = &versioning {
            layers.prepend(Box::new(VersionNegotiationLayer::new(config.clone())));
        }

        Pipeline::new(router, layers, versioning)
    }

    /// Run the server
    ///
    /// ```rust,ignore
    /// Mediaver::new()
    ///     .route("/", get(hello))
    ///     .run("127.0.0.1:8080")
    ///     .await
    /// ```
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Server::new(self.build()).run(addr).await
    }
}

impl Default for Mediaver {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize versioning on `app` with the vendor media type
/// `vendor_media_type`, e.g. `application/vnd.acme+json`
///
/// # Panics
///
/// Panics if versioning was already initialized on `app`.
pub fn init_versioning(app: &mut Mediaver, vendor_media_type: &str) {
    if let Some(existing) = &app.versioning {
        panic!(
            "Versioning is already initialized with `{}`; `init_versioning` must be called once",
            existing.vendor_media_type()
        );
    }

    let config = VersioningConfig::new(vendor_media_type);
    info!(vendor_media_type = config.vendor_media_type(), "Versioning initialized");
    app.versioning = Some(config);
}

/// Add the OpenAPI JSON route, and the Swagger UI route when enabled
fn mount_docs(router: Router, config: &OpenApiConfig, document: Arc<VersionedDocument>) -> Router {
    let json_handler = move || {
        let document = document.clone();
        async move { mediaver_openapi::openapi_json(document.document()) }
    };
    let router = router.route(&config.json_path, get(json_handler));

    #[cfg(feature = "swagger-ui")]
    let router = {
        let url = config.json_path.clone();
        let title = config.title.clone();
        let docs_handler = move || {
            let url = url.clone();
            let title = title.clone();
            async move { mediaver_openapi::swagger_ui_html(&url, &title) }
        };
        router.route(&config.docs_path, get(docs_handler))
    };

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version_tag::versioned;

    async fn hello() -> &'static str {
        "hello"
    }

    #[test]
    fn versioning_is_initialized_once() {
        let mut app = Mediaver::new();
        assert!(app.versioning_config().is_none());

        init_versioning(&mut app, "application/vnd.acme+json");
        assert_eq!(
            app.versioning_config().unwrap().vendor_media_type(),
            "application/vnd.acme+json"
        );
    }

    #[test]
    #[should_panic(expected = "Versioning is already initialized")]
    fn second_initialization_panics() {
        let mut app = Mediaver::new().versioning("application/vnd.acme+json");
        init_versioning(&mut app, "application/vnd.other+json");
    }

    #[test]
    #[should_panic(expected = "versioning is not initialized")]
    fn versioned_routes_require_versioning() {
        let _ = Mediaver::new()
            .route("/items", get(versioned((1, 0), hello)))
            .build();
    }

    #[test]
    fn plain_routes_build_without_versioning() {
        let _ = Mediaver::new().route("/items", get(hello)).build();
    }

    #[test]
    fn settings_configure_the_app() {
        let app = Mediaver::from_settings(MediaverSettings {
            vendor_media_type: Some("application/vnd.acme+json".to_string()),
            docs_path: Some("/api-docs".to_string()),
            json_path: None,
            title: Some("Acme".to_string()),
        });

        assert_eq!(app.openapi_config().title, "Acme");
        assert_eq!(app.openapi_config().docs_path, "/api-docs");
        assert_eq!(app.openapi_config().json_path, "/openapi.json");
        assert!(app.versioning_config().is_some());
    }

    #[test]
    fn openapi_info_replaces_the_info_block() {
        let app = Mediaver::new()
            .openapi_info("Acme", "0.2.0", Some("Orders"))
            .openapi_info("Acme", "0.3.0", None);

        let config = app.openapi_config();
        assert_eq!(config.version, "0.3.0");
        assert!(config.description.is_none());
        assert_eq!(config.json_path, "/openapi.json");
    }
}
