//! Session token authentication.
//!
//! Tokens are resolved on every request and the caller's role is read back
//! from the identity store, so role changes and deletions take effect
//! immediately.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::auth::Caller;
use crate::db::User;
use crate::web::dto::ViewTokenQuery;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Extractor for authenticated users.
///
/// Requires an `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    /// Caller context for authorization.
    pub fn caller(&self) -> Caller {
        Caller::from_user(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = Arc::<AppState>::from_ref(state);
        let token = bearer_token(parts).ok_or_else(no_token)?;
        resolve_user(&state, &token).await.map(AuthUser)
    }
}

/// Extractor for the inline view route.
///
/// Accepts the bearer header or, failing that, a `?token=` query parameter
/// so the file can be embedded directly in `<img>` or `<video>` tags.
#[derive(Debug, Clone)]
pub struct ViewAuthUser(pub User);

impl ViewAuthUser {
    /// Caller context for authorization.
    pub fn caller(&self) -> Caller {
        Caller::from_user(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ViewAuthUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = Arc::<AppState>::from_ref(state);

        let token = match bearer_token(parts) {
            Some(token) => token,
            None => {
                let query = Query::<ViewTokenQuery>::from_request_parts(parts, &state)
                    .await
                    .map(|Query(query)| query)
                    .unwrap_or_default();
                query
                    .token
                    .filter(|t| !t.is_empty())
                    .ok_or_else(no_token)?
            }
        };

        resolve_user(&state, &token).await.map(ViewAuthUser)
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn no_token() -> ApiError {
    ApiError::unauthorized("Not authorized, no token")
}

async fn resolve_user(state: &AppState, token: &str) -> Result<User, ApiError> {
    let claims = state.tokens.resolve(token)?;

    state
        .users()
        .get_by_id(claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::debug!(user_id = claims.sub, "token for a deleted user");
            ApiError::unauthorized("Not authorized, user not found")
        })
}
