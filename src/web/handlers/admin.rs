//! Admin handlers for Web API.
//!
//! The authorization rules refuse everyone but administrators, so these
//! handlers only translate between HTTP and the admin services.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::admin::PlatformStats;
use crate::auth::{enforce, Action};
use crate::web::dto::{
    RoleUpdatedResponse, UpdateRoleRequest, UserDeletedResponse, UserResponse, UserUsageResponse,
    ValidatedJson,
};
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;
use crate::DriveError;

/// GET /api/admin/users - Every account with storage usage, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    responses(
        (status = 200, description = "All users", body = Vec<UserUsageResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not an administrator", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_list_users(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<UserUsageResponse>>, ApiError> {
    let users = state.user_admin().list_users(&auth.caller()).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// PUT /api/admin/users/:id/role - Change a user's role.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleUpdatedResponse),
        (status = 400, description = "Invalid role or self-demotion", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not an administrator", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_update_role(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    body: Result<ValidatedJson<UpdateRoleRequest>, ApiError>,
) -> Result<Json<RoleUpdatedResponse>, ApiError> {
    let caller = auth.caller();
    let req = match body {
        Ok(ValidatedJson(req)) => req,
        Err(rejection) => {
            // Non-administrators get 403 whatever the body holds.
            enforce(
                &caller,
                &Action::UpdateRole {
                    target_id: user_id,
                    role: "admin",
                },
            )
            .map_err(DriveError::from)?;
            return Err(rejection);
        }
    };

    let user = state
        .user_admin()
        .update_role(&caller, user_id, &req.role)
        .await?;

    Ok(Json(RoleUpdatedResponse {
        message: format!("User role updated to {}", user.role),
        user: UserResponse::from(&user),
    }))
}

/// DELETE /api/admin/users/:id - Delete a user and all their files.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = UserDeletedResponse),
        (status = 400, description = "Self-deletion", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not an administrator", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_delete_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserDeletedResponse>, ApiError> {
    let deleted_files = state
        .user_admin()
        .delete_user(&auth.caller(), user_id)
        .await?;

    Ok(Json(UserDeletedResponse {
        message: "User and all their files deleted successfully".to_string(),
        deleted_files,
    }))
}

/// GET /api/admin/stats - Platform statistics.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "admin",
    responses(
        (status = 200, description = "Platform statistics", body = PlatformStats),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not an administrator", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_stats(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<PlatformStats>, ApiError> {
    Ok(Json(state.stats().compute(&auth.caller()).await?))
}
