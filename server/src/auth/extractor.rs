use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::token::TokenType;
use crate::db::RepoError;
use crate::models::user::User;
use crate::state::AppState;
use crate::utils::error::AppError;

/// The caller identified by a valid `Authorization: Bearer <access token>`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::AuthError("Authentication credentials were not provided".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::AuthError("Authorization header must use the Bearer scheme".to_string()))?;

        let claims = state.tokens.decode(token, TokenType::Access)?;

        let user = match state.repo.get_user(claims.sub).await {
            Ok(user) => user,
            Err(RepoError::NotFound(_)) => {
                return Err(AppError::AuthError("User no longer exists".to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if !user.is_active {
            return Err(AppError::AuthError("User account is disabled".to_string()));
        }

        Ok(AuthUser(user))
    }
}

pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Administrator privileges are required".to_string()))
    }
}

pub fn require_staff(user: &User) -> Result<(), AppError> {
    if user.is_staff || user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Staff privileges are required".to_string()))
    }
}

pub fn is_owner_or_admin(user: &User, owner_id: i64) -> bool {
    user.id == owner_id || user.is_admin
}
