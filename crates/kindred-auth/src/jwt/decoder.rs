//! JWT token validation.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use kindred_core::config::AuthConfig;
use kindred_core::error::AppError;
use kindred_core::result::AppResult;
use kindred_core::traits::CredentialVerifier;
use kindred_core::types::UserId;

use super::claims::{Claims, TokenType};

/// Validates JWT access tokens presented by gateway clients.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;
        if let Some(issuer) = &config.jwt_issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    ///
    /// Checks:
    /// 1. Signature validity
    /// 2. Expiration (with leeway)
    /// 3. Issuer, when configured
    /// 4. Token type is Access
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;

        if claims.token_type != TokenType::Access {
            return Err(AppError::authentication(
                "Invalid token type: expected access token",
            ));
        }

        Ok(claims)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                        AppError::authentication("Invalid token issuer")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl CredentialVerifier for JwtDecoder {
    async fn verify(&self, credential: &str) -> AppResult<UserId> {
        let claims = self.decode_access_token(credential.trim())?;
        tracing::trace!(user_id = %claims.sub, jti = %claims.jti, "Access token verified");
        Ok(claims.user_id())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use kindred_core::error::ErrorKind;

    use super::*;
    use crate::jwt::encoder::JwtEncoder;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            jwt_issuer: Some("kindred-api".to_string()),
            leeway_seconds: 0,
            access_token_ttl_seconds: 60,
        }
    }

    fn claims(user_id: UserId, exp_offset: i64, token_type: TokenType) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: user_id,
            iss: Some("kindred-api".to_string()),
            iat: now,
            exp: now + exp_offset,
            jti: Uuid::new_v4(),
            token_type,
        }
    }

    #[tokio::test]
    async fn test_verify_issued_token() {
        let config = config("secret");
        let user_id = UserId::new();
        let token = JwtEncoder::new(&config)
            .issue_access_token(user_id)
            .expect("sign");

        let verified = JwtDecoder::new(&config).verify(&token).await.expect("verify");
        assert_eq!(verified, user_id);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let config = config("secret");
        let token = JwtEncoder::new(&config)
            .sign(&claims(UserId::new(), -120, TokenType::Access))
            .expect("sign");

        let err = JwtDecoder::new(&config).verify(&token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, "Token has expired");
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let token = JwtEncoder::new(&config("one"))
            .issue_access_token(UserId::new())
            .expect("sign");

        let err = JwtDecoder::new(&config("two")).verify(&token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_refresh_token_rejected() {
        let config = config("secret");
        let token = JwtEncoder::new(&config)
            .sign(&claims(UserId::new(), 120, TokenType::Refresh))
            .expect("sign");

        let err = JwtDecoder::new(&config).verify(&token).await.unwrap_err();
        assert!(err.message.contains("expected access token"));
    }

    #[tokio::test]
    async fn test_issuer_mismatch_rejected() {
        let mut other = config("secret");
        other.jwt_issuer = Some("someone-else".to_string());
        let token = JwtEncoder::new(&other)
            .issue_access_token(UserId::new())
            .expect("sign");

        let err = JwtDecoder::new(&config("secret")).verify(&token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_garbage_rejected() {
        let err = JwtDecoder::new(&config("secret"))
            .verify("not.a.jwt")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
}
