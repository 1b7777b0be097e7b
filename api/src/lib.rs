use authz::PermissionEngine;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use database::CredentialStore;
use drive::{FileStore, ResourceHierarchy};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use user::AuthManager;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

pub mod error;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;


// Re-export server functions for convenience
pub use server::{start_server_with_config, ApiConfig};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub auth: Arc<AuthManager>,
    pub engine: Arc<PermissionEngine>,
    pub hierarchy: Arc<ResourceHierarchy>,
    pub files: Arc<FileStore>,
}

impl AppState {
    /// Wire the services together around one store and one permission engine
    pub fn new(store: Arc<dyn CredentialStore>, auth: AuthManager, files: FileStore) -> Self {
        let engine = Arc::new(PermissionEngine::with_lazy_cache());
        let hierarchy = Arc::new(ResourceHierarchy::new(
            Arc::clone(&store),
            Arc::clone(&engine),
        ));

        Self {
            store,
            auth: Arc::new(auth),
            engine,
            hierarchy,
            files: Arc::new(files),
        }
    }
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::create_key,
        handlers::auth::verify_key,
        handlers::drive::read_file,
        handlers::drive::delete_file,
        handlers::drive::read_folder,
        handlers::drive::create_folder,
        handlers::drive::delete_folder,
        handlers::drive::upload_file,
        handlers::drive::share_resource,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::LoginRequest,
            models::LoginResponse,
            models::KeyRequest,
            models::KeyResponse,
            models::KeyVerifyResponse,
            models::ResourceResponse,
            models::CreateFolderRequest,
            models::ShareRequest,
            models::DeleteResponse,
            models::SuccessResponse,
            models::HealthResponse,
            models::StoreHealth,
            error::ApiErrorResponse,
            error::ErrorDetail,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Sessions and capability keys"),
        (name = "drive", description = "Files and folders"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Drive API",
        version = "1.0.0",
        description = "File drive with grant-based permissions",
    ),
)]
pub struct ApiDoc;

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // API v1 routes
    let api_v1 = Router::new()
        // Session and key endpoints
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/keys", post(handlers::auth::create_key))
        .route("/auth/keys/verify", get(handlers::auth::verify_key))
        // Drive endpoints
        .route(
            "/drive/file/:name",
            get(handlers::drive::read_file).delete(handlers::drive::delete_file),
        )
        .route(
            "/drive/folder/:name",
            get(handlers::drive::read_folder)
                .post(handlers::drive::create_folder)
                .delete(handlers::drive::delete_folder),
        )
        .route("/drive/upload", post(handlers::drive::upload_file))
        .route("/drive/share/:name", post(handlers::drive::share_resource))
        // Health check and API description
        .route("/health", get(handlers::health::health_check))
        .route("/openapi.json", get(handlers::health::openapi_json));

    // Main router; the gate sees full paths because it wraps the nest
    Router::new()
        .nest("/api/v1", api_v1)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::authentication_middleware,
        ))
        .layer(middleware::from_fn(middleware_hooks::request_middleware))
        .layer(middleware::from_fn(middleware_hooks::response_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
