//! Google OAuth token endpoint adapter and consent URL construction
//!
//! Implements the `TokenEndpoint` port against the Google OAuth 2.0 token
//! endpoint. The consent URL always requests offline access with forced
//! consent so a refresh token is issued.

use agendasync_domain::{AgendaSyncError, GoogleConfig, Result, TokenGrant};
use agendasync_core::TokenEndpoint;
use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, instrument, warn};
use url::Url;

use super::types::{GoogleTokenResponse, OAuthErrorBody};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Google OAuth 2.0 token-endpoint client.
pub struct GoogleOAuthClient {
    http: HttpClient,
    client_id: String,
    client_secret: String,
    token_endpoint: String,
}

impl GoogleOAuthClient {
    /// Create a client from the engine's Google configuration.
    pub fn new(http: HttpClient, config: &GoogleConfig) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_endpoint: config.token_endpoint.clone(),
        }
    }

    async fn request_tokens(&self, form: &[(&str, &str)], context: &str) -> Result<TokenGrant> {
        let request = self.http.request(Method::POST, &self.token_endpoint).form(form);
        let response = self.http.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let oauth_error: OAuthErrorBody =
                serde_json::from_str(&body).unwrap_or_else(|_| OAuthErrorBody {
                    error: String::new(),
                    error_description: None,
                });

            // invalid_grant means the refresh token was revoked or expired;
            // the caller must prompt re-authorization, never retry.
            if oauth_error.error == "invalid_grant" {
                warn!(context, "token endpoint reported invalid_grant");
                return Err(AgendaSyncError::AuthExpired(format!(
                    "{context}: {}",
                    oauth_error
                        .error_description
                        .unwrap_or_else(|| "grant is invalid or revoked".to_string())
                )));
            }

            let detail = if oauth_error.error.is_empty() { body } else { oauth_error.error };
            return Err(if status.is_server_error()
                || status == reqwest::StatusCode::TOO_MANY_REQUESTS
            {
                AgendaSyncError::Transient(format!("{context} ({status}): {detail}"))
            } else {
                AgendaSyncError::InvalidRequest(format!("{context} ({status}): {detail}"))
            });
        }

        let token_response: GoogleTokenResponse =
            response.json().await.map_err(|e| AgendaSyncError::from(InfraError::from(e)))?;

        debug!(context, rotated = token_response.refresh_token.is_some(), "tokens issued");

        let scopes = token_response
            .scope
            .map(|scope| scope.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(TokenGrant::new(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
            scopes,
        ))
    }
}

#[async_trait]
impl TokenEndpoint for GoogleOAuthClient {
    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant> {
        self.request_tokens(
            &[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ],
            "code exchange",
        )
        .await
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.request_tokens(
            &[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ],
            "token refresh",
        )
        .await
    }
}

/// Build the provider consent URL for a user.
///
/// `state` carries the internal user id for correlation on callback.
/// `access_type=offline` with `prompt=consent` guarantees a refresh token is
/// issued.
pub fn authorization_url(config: &GoogleConfig, state: &str) -> Result<String> {
    let mut url = Url::parse(&config.auth_endpoint)
        .map_err(|e| AgendaSyncError::Config(format!("invalid auth endpoint URL: {e}")))?;

    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", &config.scopes.join(" "))
        .append_pair("state", state)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");

    Ok(url.to_string())
}
