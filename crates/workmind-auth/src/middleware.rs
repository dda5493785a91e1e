use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AuthError;
use crate::jwt::{AuthClaims, verify_jwt};
use crate::store::PermissionStore;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
    pub store: Arc<dyn PermissionStore>,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = parts
            .extensions
            .get::<AuthState>()
            .ok_or(AuthError::Internal("auth not configured".into()))?;

        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        let bearer = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token,
            None => return Err(AuthError::Unauthorized),
        };

        let claims: AuthClaims = verify_jwt(bearer, &auth_state.jwt_secret)?;
        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
