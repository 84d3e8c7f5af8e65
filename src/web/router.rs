//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::WebConfig;
use crate::file::media::MAX_UPLOAD_BYTES;

use super::handlers::{
    admin_delete_user, admin_list_users, admin_stats, admin_update_role, all_files, delete_file,
    download_file, health_check, login, my_files, profile, register, upload_file, view_file,
    AppState,
};
use super::middleware::{
    api_rate_limit, auth_rate_limit, create_cors_layer, security_headers, RateLimitState,
};
use super::openapi::ApiDoc;

/// Headroom for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, web_config: &WebConfig) -> Router {
    let rate_limit_state = Arc::new(RateLimitState::new(
        web_config.login_rate_limit,
        web_config.api_rate_limit,
    ));
    rate_limit_state.clone().start_cleanup_task();

    // Registration and login (no authentication, tighter rate limit)
    let auth_limit = rate_limit_state.clone();
    let user_public_routes = Router::new()
        .route("/", post(register))
        .route("/login", post(login))
        .layer(middleware::from_fn(move |req, next| {
            let state = auth_limit.clone();
            auth_rate_limit(state, req, next)
        }));

    let user_routes = Router::new()
        .merge(user_public_routes)
        .route("/profile", get(profile));

    let file_routes = Router::new()
        .route(
            "/",
            post(upload_file)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES as usize + MULTIPART_OVERHEAD)),
        )
        .route("/myfiles", get(my_files))
        .route("/all", get(all_files))
        .route("/view/:id", get(view_file))
        .route("/download/:id", get(download_file))
        .route("/:id", delete(delete_file));

    let admin_routes = Router::new()
        .route("/users", get(admin_list_users))
        .route("/users/:id/role", put(admin_update_role))
        .route("/users/:id", delete(admin_delete_user))
        .route("/stats", get(admin_stats));

    let api_limit = rate_limit_state;
    let api_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/files", file_routes)
        .nest("/admin", admin_routes)
        .layer(middleware::from_fn(move |req, next| {
            let state = api_limit.clone();
            api_rate_limit(state, req, next)
        }))
        .route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(create_swagger_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&web_config.cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Swagger UI at `/swagger-ui`, document at `/api-docs/openapi.json`.
pub fn create_swagger_router() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
