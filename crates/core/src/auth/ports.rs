//! Credential persistence and token-endpoint port interfaces

use agendasync_domain::{OAuthCredential, Result, TokenGrant};
use async_trait::async_trait;

/// Persistence port for per-owner OAuth credentials.
///
/// Store failures are fatal to the operation in progress: an unpersisted
/// refreshed token risks permanent credential loss.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the credential for an owner, if one is stored.
    async fn load(&self, owner_id: &str) -> Result<Option<OAuthCredential>>;

    /// Insert or replace the owner's credential in a single atomic write.
    async fn upsert(&self, credential: &OAuthCredential) -> Result<()>;

    /// Remove the owner's credential.
    async fn delete(&self, owner_id: &str) -> Result<()>;
}

/// Provider token-endpoint port.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant>;

    /// Exchange a refresh token for a new access token. A provider
    /// `invalid_grant` response surfaces as `AuthExpired`.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;
}
