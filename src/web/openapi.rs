//! OpenAPI document for the HTTP API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::admin::PlatformStats;
use crate::web::dto::{
    AuthResponse, FileResponse, FileWithOwnerResponse, HealthResponse, LoginRequest,
    MessageResponse, OwnerResponse, RegisterRequest, RoleUpdatedResponse, UpdateRoleRequest,
    UserDeletedResponse, UserResponse, UserUsageResponse,
};
use crate::web::error::ErrorBody;
use crate::web::handlers;

/// Generated API description served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(title = "minidrive", description = "Multi-tenant file storage API"),
    paths(
        handlers::register,
        handlers::login,
        handlers::profile,
        handlers::upload_file,
        handlers::my_files,
        handlers::all_files,
        handlers::view_file,
        handlers::download_file,
        handlers::delete_file,
        handlers::admin_list_users,
        handlers::admin_update_role,
        handlers::admin_delete_user,
        handlers::admin_stats,
        handlers::health_check,
    ),
    components(schemas(
        AuthResponse,
        ErrorBody,
        FileResponse,
        FileWithOwnerResponse,
        HealthResponse,
        LoginRequest,
        MessageResponse,
        OwnerResponse,
        PlatformStats,
        RegisterRequest,
        RoleUpdatedResponse,
        UpdateRoleRequest,
        UserDeletedResponse,
        UserResponse,
        UserUsageResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "users", description = "Registration, login and profile"),
        (name = "files", description = "Upload, listing, streaming and deletion"),
        (name = "admin", description = "User management and statistics"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
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
