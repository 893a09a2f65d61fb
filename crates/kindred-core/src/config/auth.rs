//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Credential verification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT verification (HMAC-SHA256). Shared with the
    /// service that issues tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Expected `iss` claim, if any.
    #[serde(default)]
    pub jwt_issuer: Option<String>,
    /// Allowed clock skew in seconds when checking expiry.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// Lifetime of tokens minted by the encoder, in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_issuer: None,
            leeway_seconds: default_leeway(),
            access_token_ttl_seconds: default_access_ttl(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_leeway() -> u64 {
    5
}

fn default_access_ttl() -> u64 {
    900
}
