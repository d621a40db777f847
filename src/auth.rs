//! Bearer token verification and identity extractors.
//!
//! Tokens are HS256-signed JWTs issued by the identity provider. Only
//! verification happens here; issuing tokens is out of scope for this service.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;

use crate::{error::AppError, routes::AppState};

/// Identity claims read from a verified token
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "cognito:username")]
    pub cognito_username: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
}

impl Claims {
    /// `email`, then `cognito:username`, then `sub`
    pub fn email(&self) -> Option<String> {
        self.email
            .clone()
            .or_else(|| self.cognito_username.clone())
            .or_else(|| self.sub.clone())
            .filter(|email| !email.is_empty())
    }

    /// `cognito:username`, then `given_name`, then `name`, then the email's local part
    pub fn username(&self, email: &str) -> String {
        self.cognito_username
            .clone()
            .or_else(|| self.given_name.clone())
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string())
    }
}

/// Checks token signatures and expiry against the shared secret
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AppError> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                AppError::Unauthorized("Invalid or expired token".to_string())
            })?
            .claims;

        let email = claims.email().ok_or_else(|| {
            AppError::Unauthorized("Token carries no user identity".to_string())
        })?;
        let username = claims.username(&email);

        Ok(AuthUser { email, username })
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".to_string())
    })
}

/// Caller identity for endpoints that require sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub email: String,
    pub username: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        state.jwt.verify(token)
    }
}

/// Caller identity for endpoints that also serve anonymous users
///
/// A missing or invalid token yields `None` instead of a rejection.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = bearer_token(parts)
            .and_then(|token| state.jwt.verify(token))
            .ok();
        Ok(MaybeAuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    const SECRET: &str = "test-secret";

    fn token(claims: Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_email_claim_wins() {
        let verifier = JwtVerifier::new(SECRET);
        let user = verifier
            .verify(&token(
                json!({
                    "sub": "abc-123",
                    "email": "jane@example.com",
                    "cognito:username": "jane",
                    "exp": exp()
                }),
                SECRET,
            ))
            .unwrap();

        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.username, "jane");
    }

    #[test]
    fn test_falls_back_to_cognito_username_then_sub() {
        let verifier = JwtVerifier::new(SECRET);

        let user = verifier
            .verify(&token(
                json!({"sub": "abc-123", "cognito:username": "jane", "exp": exp()}),
                SECRET,
            ))
            .unwrap();
        assert_eq!(user.email, "jane");

        let user = verifier
            .verify(&token(json!({"sub": "abc-123", "exp": exp()}), SECRET))
            .unwrap();
        assert_eq!(user.email, "abc-123");
        assert_eq!(user.username, "abc-123");
    }

    #[test]
    fn test_username_precedence() {
        let claims = Claims {
            given_name: Some("Jane".to_string()),
            name: Some("Jane Doe".to_string()),
            ..Default::default()
        };
        assert_eq!(claims.username("jd@example.com"), "Jane");

        let claims = Claims {
            name: Some("Jane Doe".to_string()),
            ..Default::default()
        };
        assert_eq!(claims.username("jd@example.com"), "Jane Doe");

        assert_eq!(Claims::default().username("jd@example.com"), "jd");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let verifier = JwtVerifier::new(SECRET);
        let result = verifier.verify(&token(
            json!({"email": "jane@example.com", "exp": exp()}),
            "other-secret",
        ));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = JwtVerifier::new(SECRET);
        let expired = chrono::Utc::now().timestamp() - 3600;
        let result = verifier.verify(&token(
            json!({"email": "jane@example.com", "exp": expired}),
            SECRET,
        ));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_token_without_identity_is_rejected() {
        let verifier = JwtVerifier::new(SECRET);
        let result = verifier.verify(&token(json!({"exp": exp()}), SECRET));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
