//! Google Calendar integration
//!
//! HTTP adapters for the Google Calendar v3 API and the Google OAuth token
//! endpoint, plus the inbound notification stub.

pub mod client;
pub mod oauth;
pub mod types;
pub mod webhook;

pub use client::GoogleCalendarClient;
pub use oauth::{authorization_url, GoogleOAuthClient};
pub use webhook::handle_provider_notification;
