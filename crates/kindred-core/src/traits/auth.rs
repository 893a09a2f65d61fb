//! Credential verification trait.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::UserId;

/// Turns a client-supplied credential into a verified user identifier.
///
/// Implementations return an [`ErrorKind::Authentication`] error for bad,
/// expired, or revoked credentials.
///
/// [`ErrorKind::Authentication`]: crate::error::ErrorKind::Authentication
#[async_trait]
pub trait CredentialVerifier: Send + Sync + std::fmt::Debug + 'static {
    /// Verify a credential and return the user it belongs to.
    async fn verify(&self, credential: &str) -> AppResult<UserId>;
}
