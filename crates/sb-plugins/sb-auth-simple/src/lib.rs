//! # sb-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing and HS256 access/refresh tokens.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sb_core::error::{AppError, Result};
use sb_core::traits::{AuthProvider, TokenKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id
    sub: i64,
    /// "access" or "refresh"
    kind: String,
    iat: i64,
    exp: i64,
}

fn kind_label(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Access => "access",
        TokenKind::Refresh => "refresh",
    }
}

pub struct SimpleAuthProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SimpleAuthProvider {
    /// Accepts the signing secret (e.g., from `SB_AUTH__JWT_SECRET`)
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_token(&self, user_id: i64, kind: TokenKind, ttl: TimeDelta) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            kind: kind_label(kind).to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    fn verify_token(&self, token: &str, kind: TokenKind) -> Result<i64> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized("invalid or expired token".into())
        })?;

        if data.claims.kind != kind_label(kind) {
            return Err(AppError::Unauthorized(format!(
                "expected {} token",
                kind_label(kind)
            )));
        }
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SimpleAuthProvider {
        SimpleAuthProvider::new(&SecretString::from("unit-test-secret".to_string()))
    }

    #[tokio::test]
    async fn test_hash_then_verify() {
        let auth = provider();
        let hash = auth.hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(auth.verify_password("correct horse", &hash).await);
        assert!(!auth.verify_password("wrong horse", &hash).await);
        assert!(!auth.verify_password("correct horse", "not-a-hash").await);
    }

    #[test]
    fn test_token_carries_user_id() {
        let auth = provider();
        let token = auth
            .issue_token(42, TokenKind::Access, TimeDelta::minutes(15))
            .unwrap();
        assert_eq!(auth.verify_token(&token, TokenKind::Access).unwrap(), 42);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let auth = provider();
        let refresh = auth
            .issue_token(7, TokenKind::Refresh, TimeDelta::hours(2))
            .unwrap();

        assert!(matches!(
            auth.verify_token(&refresh, TokenKind::Access),
            Err(AppError::Unauthorized(_))
        ));
        assert_eq!(auth.verify_token(&refresh, TokenKind::Refresh).unwrap(), 7);
    }

    #[test]
    fn test_expired_and_foreign_tokens_rejected() {
        let auth = provider();
        let expired = auth
            .issue_token(1, TokenKind::Access, TimeDelta::minutes(-10))
            .unwrap();
        assert!(auth.verify_token(&expired, TokenKind::Access).is_err());

        let other = SimpleAuthProvider::new(&SecretString::from("another-secret".to_string()));
        let foreign = other
            .issue_token(1, TokenKind::Access, TimeDelta::minutes(15))
            .unwrap();
        assert!(auth.verify_token(&foreign, TokenKind::Access).is_err());
    }
}
