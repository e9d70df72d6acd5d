//! `AuthUser` extractor: builds the caller context from trusted gateway headers.
//!
//! Authentication happens upstream; the gateway forwards the verified user
//! id and role. A missing role means an ordinary customer.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tourhub_core::AppError;
use tourhub_core::types::UserId;
use tourhub_entity::user::UserRole;
use tourhub_service::AuthContext;

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated caller available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

impl std::ops::Deref for AuthUser {
    type Target = AuthContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication(format!("Missing {USER_ID_HEADER} header")))?;
        let user_id: UserId = raw_id
            .trim()
            .parse()
            .map_err(|_| AppError::authentication(format!("Invalid {USER_ID_HEADER} header")))?;

        let role = match parts.headers.get(USER_ROLE_HEADER) {
            Some(value) => value
                .to_str()
                .map_err(|_| AppError::authentication(format!("Invalid {USER_ROLE_HEADER} header")))?
                .trim()
                .parse::<UserRole>()
                .map_err(|e| AppError::authentication(e.message))?,
            None => UserRole::User,
        };

        Ok(AuthUser(AuthContext::new(user_id, role)))
    }
}
