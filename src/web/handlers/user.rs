//! Account handlers: registration, login and profile.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::auth::{self, RegistrationRequest};
use crate::db::User;
use crate::web::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse, ValidatedJson};
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

fn auth_response(state: &AppState, user: &User) -> Result<AuthResponse, ApiError> {
    let token = state.tokens.issue(user.id, user.role)?;
    Ok(AuthResponse {
        user: UserResponse::from(user),
        token,
    })
}

/// POST /api/users - Register a new account.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields, or email taken", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = auth::register(
        &state.users(),
        RegistrationRequest::new(req.name, req.email, req.password),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

/// POST /api/users/login - Exchange credentials for a session token.
#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = auth::login(&state.users(), &req.email, &req.password).await?;
    Ok(Json(auth_response(&state, &user)?))
}

/// GET /api/users/profile - The authenticated account.
#[utoipa::path(
    get,
    path = "/api/users/profile",
    tag = "users",
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn profile(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}
