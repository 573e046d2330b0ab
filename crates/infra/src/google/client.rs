//! Google Calendar API client
//!
//! Stateless adapter implementing the `CalendarApi` port. Every call takes
//! the access token explicitly; credential state lives in the credential
//! manager.

use std::collections::HashMap;

use agendasync_domain::{
    constants::LIST_EVENTS_MAX_RESULTS, AgendaSyncError, BusyInterval, CalendarEvent,
    EventPayload, Result,
};
use agendasync_core::CalendarApi;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, Response, StatusCode};
use tracing::{debug, instrument};

use super::types::{
    parse_rfc3339_utc, FreeBusyRequest, FreeBusyRequestItem, FreeBusyResponse,
    GoogleApiErrorEnvelope, GoogleEventBody, GoogleEventRef, GoogleEventsListResponse,
};
use crate::errors::InfraError;
use crate::http::HttpClient;

const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar v3 adapter.
pub struct GoogleCalendarClient {
    http: HttpClient,
    api_base: String,
}

impl GoogleCalendarClient {
    /// Create a client against the production API base.
    pub fn new(http: HttpClient) -> Self {
        Self::with_api_base(http, GOOGLE_CALENDAR_API_BASE)
    }

    /// Create a client against a custom API base (tests point this at a
    /// local mock server).
    pub fn with_api_base(http: HttpClient, api_base: impl Into<String>) -> Self {
        Self { http, api_base: api_base.into() }
    }

    /// Map a non-success calendar API response to the domain taxonomy.
    async fn api_error(response: Response, context: &str) -> AgendaSyncError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoogleApiErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);

        match status {
            StatusCode::UNAUTHORIZED => AgendaSyncError::AuthExpired(format!(
                "{context}: provider rejected the access token"
            )),
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                AgendaSyncError::Transient(format!("{context} ({status}): {message}"))
            }
            status if status.is_server_error() => {
                AgendaSyncError::Transient(format!("{context} ({status}): {message}"))
            }
            _ => AgendaSyncError::InvalidRequest(format!("{context} ({status}): {message}")),
        }
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", self.api_base, calendar_id)
    }
}

/// The external event is already gone; update/delete treat this as success.
fn already_gone(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    #[instrument(skip(self, access_token, payload))]
    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> Result<String> {
        let body = GoogleEventBody::from(payload);
        let request = self
            .http
            .request(Method::POST, self.events_url(calendar_id))
            .bearer_auth(access_token)
            .json(&body);

        let response = self.http.send(request).await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response, "create event").await);
        }

        let created: GoogleEventRef =
            response.json().await.map_err(|e| AgendaSyncError::from(InfraError::from(e)))?;
        debug!(external_id = %created.id, "event created");
        Ok(created.id)
    }

    #[instrument(skip(self, access_token, payload))]
    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        external_id: &str,
        payload: &EventPayload,
    ) -> Result<()> {
        let body = GoogleEventBody::from(payload);
        let url = format!("{}/{}", self.events_url(calendar_id), external_id);
        let request =
            self.http.request(Method::PUT, url).bearer_auth(access_token).json(&body);

        let response = self.http.send(request).await?;
        let status = response.status();
        if already_gone(status) {
            debug!(external_id, "event already gone; update is a no-op");
            return Ok(());
        }
        if !status.is_success() {
            return Err(Self::api_error(response, "update event").await);
        }
        Ok(())
    }

    #[instrument(skip(self, access_token))]
    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        external_id: &str,
    ) -> Result<()> {
        let url = format!("{}/{}", self.events_url(calendar_id), external_id);
        let request = self.http.request(Method::DELETE, url).bearer_auth(access_token);

        let response = self.http.send(request).await?;
        let status = response.status();
        if already_gone(status) {
            debug!(external_id, "event already gone; delete is a no-op");
            return Ok(());
        }
        if !status.is_success() {
            return Err(Self::api_error(response, "delete event").await);
        }
        Ok(())
    }

    #[instrument(skip(self, access_token))]
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let request = self
            .http
            .request(Method::GET, self.events_url(calendar_id))
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", LIST_EVENTS_MAX_RESULTS.to_string()),
            ]);

        let response = self.http.send(request).await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response, "list events").await);
        }

        let listed: GoogleEventsListResponse =
            response.json().await.map_err(|e| AgendaSyncError::from(InfraError::from(e)))?;

        listed.items.into_iter().map(super::types::GoogleEventResource::into_calendar_event).collect()
    }

    #[instrument(skip(self, access_token, calendar_ids), fields(calendars = calendar_ids.len()))]
    async fn free_busy(
        &self,
        access_token: &str,
        calendar_ids: &[String],
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<HashMap<String, Vec<BusyInterval>>> {
        let body = FreeBusyRequest {
            time_min: time_min.to_rfc3339(),
            time_max: time_max.to_rfc3339(),
            items: calendar_ids
                .iter()
                .map(|id| FreeBusyRequestItem { id: id.clone() })
                .collect(),
        };

        let request = self
            .http
            .request(Method::POST, format!("{}/freeBusy", self.api_base))
            .bearer_auth(access_token)
            .json(&body);

        let response = self.http.send(request).await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response, "free/busy query").await);
        }

        let parsed: FreeBusyResponse =
            response.json().await.map_err(|e| AgendaSyncError::from(InfraError::from(e)))?;

        let mut result = HashMap::with_capacity(parsed.calendars.len());
        for (calendar_id, calendar) in parsed.calendars {
            let mut intervals = Vec::with_capacity(calendar.busy.len());
            for period in calendar.busy {
                intervals.push(BusyInterval::new(
                    parse_rfc3339_utc(&period.start, "busy start")?,
                    parse_rfc3339_utc(&period.end, "busy end")?,
                ));
            }
            result.insert(calendar_id, intervals);
        }
        Ok(result)
    }
}
