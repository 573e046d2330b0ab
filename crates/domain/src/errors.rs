//! Error types used throughout the engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for AgendaSync
///
/// Retry policy is carried by the variant: `Transient` failures may be
/// retried with backoff, `AuthExpired` requires user re-authorization and is
/// never retried automatically, `InvalidRequest` is surfaced immediately.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AgendaSyncError {
    #[error("Authorization expired: {0}")]
    AuthExpired(String),

    #[error("Transient provider error: {0}")]
    Transient(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Credential missing: {0}")]
    CredentialMissing(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgendaSyncError {
    /// Stable RPC-style code surfaced to API callers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthExpired(_) => "unauthenticated",
            Self::Transient(_) => "unavailable",
            Self::InvalidRequest(_) => "invalid-argument",
            Self::CredentialMissing(_) => "failed-precondition",
            Self::NotFound(_) => "not-found",
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => "internal",
        }
    }

    /// True when the caller may retry the failed operation with backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// True when recovering requires the user to reconnect their calendar.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::AuthExpired(_) | Self::CredentialMissing(_))
    }
}

/// Result type alias for AgendaSync operations
pub type Result<T> = std::result::Result<T, AgendaSyncError>;
