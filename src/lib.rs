use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access-control core: credential verification, role resolution, route guard.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod shutdown;
pub mod slug;
pub mod store;

// Routers grouped per resource, each declaring its role requirements.
pub mod routes;
use auth::{
    AccessGuard, JwtVerifier, RepositoryRoleResolver, ResolverState, VerifierState, access_guard,
};
use models::CatalogKind;
use routes::{categories, cities, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use slug::slugify;
pub use store::{CatalogService, StoreError};

/// ApiDoc
///
/// OpenAPI document assembled from the `#[utoipa::path]` handlers and the
/// `ToSchema` models. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login,
        handlers::create_city, handlers::list_cities, handlers::get_city,
        handlers::update_city, handlers::delete_city,
        handlers::create_category, handlers::list_categories, handlers::get_category,
        handlers::update_category, handlers::delete_category,
    ),
    components(
        schemas(
            models::CatalogEntity, models::CreateEntityRequest, models::UpdateEntityRequest,
            models::LoginRequest, models::LoginResponse, models::Role, error::ErrorBody,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "catalog-api", description = "Catalog of categories and cities")
    )
)]
struct ApiDoc;

/// Registers the `bearer` scheme referenced by the admin-only paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// Every service a request may need, wired once at startup and shared across
/// requests. Nothing in here is mutated after construction.
#[derive(Clone)]
pub struct AppState {
    /// Persistence collaborator, shared by both catalog services and the role resolver.
    pub repo: RepositoryState,
    pub verifier: VerifierState,
    pub resolver: ResolverState,
    /// Access guard holding the route policy; run in front of every route.
    pub guard: AccessGuard,
    pub categories: CatalogService,
    pub cities: CatalogService,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the default collaborators: HS256 verification with the configured
    /// secret, repository-backed role resolution, and the routes' access policy.
    pub fn new(config: AppConfig, repo: RepositoryState) -> Self {
        let verifier: VerifierState = Arc::new(JwtVerifier::new(&config.jwt_secret));
        let resolver: ResolverState = Arc::new(RepositoryRoleResolver::new(repo.clone()));
        Self::with_auth(config, repo, verifier, resolver)
    }

    /// Like [`AppState::new`] but with caller-supplied verifier and resolver.
    pub fn with_auth(
        config: AppConfig,
        repo: RepositoryState,
        verifier: VerifierState,
        resolver: ResolverState,
    ) -> Self {
        let guard = AccessGuard::new(routes::access_policy(), verifier.clone(), resolver.clone());
        Self {
            categories: CatalogService::new(CatalogKind::Category, repo.clone()),
            cities: CatalogService::new(CatalogKind::City, repo.clone()),
            repo,
            verifier,
            resolver,
            guard,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AccessGuard {
    fn from_ref(app_state: &AppState) -> AccessGuard {
        app_state.guard.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, installs the access guard on every route
/// and wraps everything in the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(public::public_routes())
        .merge(categories::category_routes())
        .merge(cities::city_routes())
        // `route_layer` runs after routing, so the guard sees the matched route template.
        .route_layer(middleware::from_fn_with_state(
            state.guard.clone(),
            access_guard,
        ))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the request id set by
/// `SetRequestIdLayer`, so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
