//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use informes_common::AppError;
use informes_core::AuthorizedUser;

use crate::middleware::{AppState, AuthRejection};

fn authorized(parts: &Parts) -> Result<AuthorizedUser, AppError> {
    if let Some(user) = parts.extensions.get::<AuthorizedUser>() {
        return Ok(user.clone());
    }
    Err(parts
        .extensions
        .get::<AuthRejection>()
        .cloned()
        .map_or(AppError::Unauthorized, AppError::from))
}

/// Authenticated, allow-listed user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthorizedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        authorized(parts).map(AuthUser)
    }
}

/// Allow-listed user currently holding the admin flag.
///
/// The flag is read from the directory on every request.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthorizedUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authorized(parts)?;
        state.access.require_admin(&user).await?;
        Ok(Self(user))
    }
}
