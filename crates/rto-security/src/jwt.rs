//! SSO token handling
//!
//! The staff SSO broker issues HS256 tokens carrying the user's profile.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token creation failed: {0}")]
    CreationError(String),
    #[error("Token validation failed: {0}")]
    ValidationError(String),
    #[error("Token expired")]
    TokenExpired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsoClaims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub contact_email: String,
    pub exp: i64,
}

pub struct SsoTokenVerifier {
    secret: String,
}

impl SsoTokenVerifier {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn verify(&self, token: &str) -> Result<SsoClaims, JwtError> {
        decode::<SsoClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            _ => JwtError::ValidationError(e.to_string()),
        })
    }

    /// Issues a token the way the broker does. Used by local tooling and tests.
    pub fn issue(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        contact_email: &str,
        ttl_seconds: i64,
    ) -> Result<String, JwtError> {
        let claims = SsoClaims {
            sub: email.to_string(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            contact_email: contact_email.to_string(),
            exp: (Utc::now() + Duration::seconds(ttl_seconds)).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| JwtError::CreationError(e.to_string()))
    }
}
