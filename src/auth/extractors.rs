use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{
    claims::{Claims, Role, TokenKind},
    jwt::JwtKeys,
};
use crate::error::AppError;

/// Reads the bearer token and validates it as an access token.
fn access_claims(parts: &Parts, keys: &JwtKeys) -> Result<Claims, AppError> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    if claims.kind != TokenKind::Access {
        return Err(AppError::Unauthorized("Access token required".into()));
    }
    Ok(claims)
}

/// Signed-in portal user; yields the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = access_claims(parts, &JwtKeys::from_ref(state))?;
        if claims.role != Role::User {
            return Err(AppError::Unauthorized("Please login to continue".into()));
        }
        Ok(AuthUser(claims.sub))
    }
}

/// Console operator.
pub struct AdminUser;

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = access_claims(parts, &JwtKeys::from_ref(state))?;
        if claims.role != Role::Admin {
            warn!(sub = %claims.sub, "non-admin token on admin route");
            return Err(AppError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser)
    }
}
