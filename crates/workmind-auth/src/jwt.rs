use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

const TOKEN_TTL_SECS: usize = 86400;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthClaims {
    /// Acting user id.
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn create_jwt(user_id: &str, email: &str, secret: &str) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = AuthClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: now + TOKEN_TTL_SECS,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode error: {e}")))
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<AuthClaims, AuthError> {
    let data = decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::Unauthorized)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_roundtrip() {
        let token = create_jwt("u1", "u1@example.test", "secret").unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "u1@example.test");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = create_jwt("u1", "u1@example.test", "secret").unwrap();
        assert!(matches!(verify_jwt(&token, "other"), Err(AuthError::Unauthorized)));
        assert!(matches!(verify_jwt("garbage", "secret"), Err(AuthError::Unauthorized)));
    }
}
