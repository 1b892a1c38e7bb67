use crate::api::{orders, products};
use crate::auth::{self, api::AuthState, JwtHandler};
use crate::catalog::CatalogStore;
use crate::middleware::{rate_limit_middleware, request_logging, RateLimitLayer};
use crate::uploads::{UploadStore, PUBLIC_PREFIX};
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub const SERVICE_NAME: &str = "KiaKart Vendor Dashboard API";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub catalog: Arc<CatalogStore>,
    pub uploads: Arc<UploadStore>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// HTTP-level limits and guards
#[derive(Clone)]
pub struct RouterConfig {
    pub max_body_bytes: usize,
    pub auth_limiter: RateLimitLayer,
}

/// Create the API router
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let jwt: Arc<JwtHandler> = state.auth.jwt_handler.clone();
    let upload_root = state.uploads.root().to_path_buf();

    // Credential endpoints (no token, rate limited per client)
    let credential_routes = Router::new()
        .route("/api/auth/register", post(auth::api::register))
        .route("/api/auth/login", post(auth::api::login))
        .route_layer(middleware::from_fn_with_state(
            config.auth_limiter,
            rate_limit_middleware,
        ));

    // Everything scoped to the calling vendor
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(auth::api::logout))
        .route("/api/vendor/profile", get(auth::api::get_profile))
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/orders", get(orders::list_orders))
        .route(
            "/api/generate-sample-orders",
            post(orders::generate_sample_orders),
        )
        .route_layer(middleware::from_fn_with_state(
            jwt,
            auth::auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .merge(credential_routes)
        .merge(protected_routes)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(upload_root))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}
