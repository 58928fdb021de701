use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;
use uuid::Uuid;

use super::cookies::read_cookie;
use crate::{error::AppError, state::AppState, users::repo_types::User};

/// Caller authenticated by the session cookie.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, &state.config.cookie.name)
            .ok_or(AppError::Unauthorized("Not authorized, no token"))?;

        let claims = state.keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::Unauthorized("Not authorized, token failed")
        })?;

        Ok(AuthUser(claims.sub))
    }
}

/// Authenticated caller whose stored record carries the administrator flag.
///
/// Authentication runs first, so a request without a valid session is
/// answered with 401 before the role is ever looked at.
#[derive(Debug)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;

        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized("Not authorized, token failed"))?;

        if !user.is_admin {
            warn!(user_id = %user_id, "admin route refused");
            return Err(AppError::Forbidden("Not authorized as an admin"));
        }
        Ok(AdminUser(user))
    }
}
