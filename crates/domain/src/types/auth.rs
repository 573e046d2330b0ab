//! OAuth credential types
//!
//! Per-user provider credentials and token-endpoint grants. The credential
//! record is owned exclusively by the credential manager: it is mutated on
//! every refresh and deleted on revocation or explicit disconnect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored OAuth credential for one calendar owner.
///
/// The refresh token is the sole means of renewing the access token, so a
/// refresh must persist the rotated refresh token in the same store write as
/// the new access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthCredential {
    /// Internal user id the credential belongs to.
    pub owner_id: String,

    /// Current access token for provider API calls.
    pub access_token: String,

    /// Long-lived refresh token; may be rotated by the provider on refresh.
    pub refresh_token: String,

    /// Absolute access-token expiration timestamp (UTC).
    pub expires_at: DateTime<Utc>,

    /// Granted scopes.
    pub scopes: Vec<String>,

    /// Redirect URI the credential was issued against.
    pub redirect_uri: String,
}

impl OAuthCredential {
    /// Check whether the access token is expired or expires within the given
    /// threshold.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        Utc::now() + chrono::Duration::seconds(threshold_seconds) >= self.expires_at
    }

    /// Seconds until the access token expires (negative when already
    /// expired).
    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }

    /// Apply a token-endpoint grant, keeping the stored refresh token when
    /// the provider did not rotate it.
    #[must_use]
    pub fn with_grant(mut self, grant: TokenGrant) -> Self {
        self.access_token = grant.access_token;
        self.expires_at = grant.expires_at;
        if let Some(rotated) = grant.refresh_token {
            self.refresh_token = rotated;
        }
        if !grant.scopes.is_empty() {
            self.scopes = grant.scopes;
        }
        self
    }
}

/// Token-endpoint response: a fresh access token plus optional rotated
/// refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Fresh access token.
    pub access_token: String,

    /// New refresh token, present when the provider rotated it. Losing track
    /// of a rotated token is unrecoverable.
    pub refresh_token: Option<String>,

    /// Absolute expiration timestamp (UTC).
    pub expires_at: DateTime<Utc>,

    /// Scopes granted with this token.
    pub scopes: Vec<String>,
}

impl TokenGrant {
    /// Build a grant from a token-endpoint response, computing `expires_at`
    /// from the relative `expires_in` lifetime.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in_seconds: i64,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in_seconds),
            scopes,
        }
    }
}
