// security/src/guard.rs

//! Request guards. `AuthNurse` resolves the bearer token to the stored
//! nurse; `AdminNurse` additionally requires the admin role. Used as axum
//! extractor arguments, so a handler that names one cannot run without it.

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use models::nurse::Nurse;
use models::{ApiError, ApiResult};
use storage::Store;

use crate::AuthService;

/// The authenticated nurse behind the request's bearer token.
pub struct AuthNurse(pub Nurse);

/// An authenticated nurse who also holds the admin role.
pub struct AdminNurse(pub Nurse);

fn bearer_token(parts: &Parts) -> ApiResult<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or_else(ApiError::invalid_token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthNurse
where
    S: Send + Sync,
    AuthService: FromRef<S>,
    Store: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let auth = AuthService::from_ref(state);
        let store = Store::from_ref(state);
        let nurse = auth.resolve(&store, &token).await?;
        Ok(AuthNurse(nurse))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminNurse
where
    S: Send + Sync,
    AuthService: FromRef<S>,
    Store: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthNurse(nurse) = AuthNurse::from_request_parts(parts, state).await?;
        if !nurse.is_admin {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminNurse(nurse))
    }
}
