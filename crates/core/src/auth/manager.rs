//! Credential manager with serialized per-owner refresh
//!
//! Manages the OAuth token lifecycle:
//! - Token retrieval from the credential store
//! - Refresh ahead of expiry (configurable skew, default 5 min)
//! - Refresh-token rotation persistence
//! - Revocation detection and cleanup

use std::sync::Arc;

use agendasync_domain::{
    constants::DEFAULT_REFRESH_SKEW_SECONDS, AgendaSyncError, OAuthCredential, Result, TokenGrant,
};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::ports::{CredentialStore, TokenEndpoint};

/// Per-user OAuth credential manager.
///
/// Refresh for a given owner is mutually exclusive: concurrent callers await
/// a single in-flight refresh rather than issuing duplicate refresh calls,
/// which would invalidate the token obtained by the other caller under
/// refresh-token rotation.
pub struct CredentialManager {
    store: Arc<dyn CredentialStore>,
    token_endpoint: Arc<dyn TokenEndpoint>,
    refresh_skew_seconds: i64,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CredentialManager {
    /// Create a new manager with the default refresh skew.
    pub fn new(store: Arc<dyn CredentialStore>, token_endpoint: Arc<dyn TokenEndpoint>) -> Self {
        Self {
            store,
            token_endpoint,
            refresh_skew_seconds: DEFAULT_REFRESH_SKEW_SECONDS,
            refresh_locks: DashMap::new(),
        }
    }

    /// Override the number of seconds before expiry at which tokens are
    /// refreshed ahead of use.
    #[must_use]
    pub fn with_refresh_skew(mut self, skew_seconds: i64) -> Self {
        self.refresh_skew_seconds = skew_seconds;
        self
    }

    /// Return a valid access token for the owner, refreshing if the stored
    /// one is expired or near expiry.
    ///
    /// Fails fast with `AuthExpired` when no credential is stored, so
    /// callers prompt re-authorization instead of retrying.
    #[instrument(skip(self))]
    pub async fn get_valid_access_token(&self, owner_id: &str) -> Result<String> {
        let credential = self.require_credential(owner_id).await?;

        if !credential.is_expired(self.refresh_skew_seconds) {
            debug!(owner_id, "access token still valid");
            return Ok(credential.access_token);
        }

        let refreshed = self.refresh(owner_id).await?;
        Ok(refreshed.access_token)
    }

    /// Refresh the owner's access token, serialized per owner.
    ///
    /// The rotated refresh token, when issued, is persisted in the same
    /// store write as the new access token before this method returns. A
    /// provider `invalid_grant` deletes the credential and surfaces
    /// `AuthExpired`.
    #[instrument(skip(self))]
    pub async fn refresh(&self, owner_id: &str) -> Result<OAuthCredential> {
        let lock = self.refresh_lock(owner_id);
        let _guard = lock.lock().await;

        // Re-read under the lock: a concurrent caller may have completed the
        // refresh while this one awaited the mutex.
        let credential = self.require_credential(owner_id).await?;
        if !credential.is_expired(self.refresh_skew_seconds) {
            debug!(owner_id, "credential already refreshed by concurrent caller");
            return Ok(credential);
        }

        let grant = match self.token_endpoint.refresh(&credential.refresh_token).await {
            Ok(grant) => grant,
            Err(AgendaSyncError::AuthExpired(message)) => {
                warn!(owner_id, "refresh token rejected; deleting credential");
                self.store.delete(owner_id).await?;
                return Err(AgendaSyncError::AuthExpired(message));
            }
            Err(other) => return Err(other),
        };

        let updated = credential.with_grant(grant);
        self.store.upsert(&updated).await?;

        info!(owner_id, "access token refreshed");
        Ok(updated)
    }

    /// Exchange an authorization code and persist the resulting credential.
    #[instrument(skip(self, code))]
    pub async fn connect(&self, owner_id: &str, code: &str, redirect_uri: &str) -> Result<()> {
        let grant = self.token_endpoint.exchange_code(code, redirect_uri).await?;
        self.store_grant(owner_id, grant, redirect_uri).await
    }

    /// Persist a token grant as the owner's credential.
    ///
    /// The grant must carry a refresh token: without one the access token
    /// cannot be renewed and the connection would silently die at first
    /// expiry.
    pub async fn store_grant(
        &self,
        owner_id: &str,
        grant: TokenGrant,
        redirect_uri: &str,
    ) -> Result<()> {
        let Some(refresh_token) = grant.refresh_token else {
            return Err(AgendaSyncError::InvalidRequest(
                "provider did not issue a refresh token; request offline access with consent"
                    .to_string(),
            ));
        };

        let credential = OAuthCredential {
            owner_id: owner_id.to_string(),
            access_token: grant.access_token,
            refresh_token,
            expires_at: grant.expires_at,
            scopes: grant.scopes,
            redirect_uri: redirect_uri.to_string(),
        };

        self.store.upsert(&credential).await?;
        info!(owner_id, "calendar credential stored");
        Ok(())
    }

    /// Remove the owner's credential (explicit disconnect).
    #[instrument(skip(self))]
    pub async fn revoke(&self, owner_id: &str) -> Result<()> {
        self.store.delete(owner_id).await?;
        info!(owner_id, "calendar credential revoked");
        Ok(())
    }

    /// Whether the owner has a stored credential.
    pub async fn is_connected(&self, owner_id: &str) -> Result<bool> {
        Ok(self.store.load(owner_id).await?.is_some())
    }

    async fn require_credential(&self, owner_id: &str) -> Result<OAuthCredential> {
        self.store.load(owner_id).await?.ok_or_else(|| {
            AgendaSyncError::AuthExpired(format!(
                "no calendar credential stored for {owner_id}; reauthorization required"
            ))
        })
    }

    fn refresh_lock(&self, owner_id: &str) -> Arc<Mutex<()>> {
        self.refresh_locks
            .entry(owner_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
