//! JWT token creation.
//!
//! The gateway never logs anyone in; the encoder exists so that tooling and
//! tests can mint tokens the decoder accepts.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use kindred_core::config::AuthConfig;
use kindred_core::error::{AppError, ErrorKind};
use kindred_core::types::UserId;

use super::claims::{Claims, TokenType};

/// Creates signed JWT access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Issuer stamped on every token.
    issuer: Option<String>,
    /// Access token TTL in seconds.
    access_ttl_seconds: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("issuer", &self.issuer)
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            access_ttl_seconds: i64::try_from(config.access_token_ttl_seconds).unwrap_or(i64::MAX),
        }
    }

    /// Issues an access token for `user_id` with the configured TTL.
    pub fn issue_access_token(&self, user_id: UserId) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        self.sign(&Claims {
            sub: user_id,
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(self.access_ttl_seconds),
            jti: Uuid::new_v4(),
            token_type: TokenType::Access,
        })
    }

    /// Signs arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to sign token", e))
    }
}
