//! Google Calendar wire types
//!
//! Serde mappings for the calendar v3 payloads and OAuth token responses.
//! The write-side body mirrors the provider contract: summary, description,
//! timed start/end with time zone, attendees, colorId, reminder overrides,
//! and private extended properties carrying the appointment correlation id.

use std::collections::{BTreeMap, HashMap};

use agendasync_domain::{
    constants::EVENT_SOURCE_TAG, AgendaSyncError, CalendarEvent, EventAttendee, EventPayload,
    Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Private extended-property key for the internal appointment id.
pub const PROP_APPOINTMENT_ID: &str = "appointmentId";
/// Private extended-property key marking events created by this engine.
pub const PROP_SOURCE: &str = "source";

/// Outbound event body for insert/update calls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventBody {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: GoogleEventTime,
    pub end: GoogleEventTime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<GoogleAttendee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<GoogleReminders>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<GoogleExtendedProperties>,
}

impl From<&EventPayload> for GoogleEventBody {
    fn from(payload: &EventPayload) -> Self {
        let reminders = if payload.reminders.is_empty() {
            None
        } else {
            Some(GoogleReminders {
                use_default: false,
                overrides: payload
                    .reminders
                    .iter()
                    .map(|reminder| GoogleReminderOverride {
                        method: reminder.method.clone(),
                        minutes: reminder.minutes,
                    })
                    .collect(),
            })
        };

        let mut private = BTreeMap::new();
        private.insert(PROP_APPOINTMENT_ID.to_string(), payload.appointment_id.clone());
        private.insert(PROP_SOURCE.to_string(), EVENT_SOURCE_TAG.to_string());

        Self {
            summary: payload.title.clone(),
            description: payload.description.clone(),
            start: GoogleEventTime::timed(payload.start, &payload.time_zone),
            end: GoogleEventTime::timed(payload.end, &payload.time_zone),
            attendees: payload
                .attendees
                .iter()
                .map(|attendee| GoogleAttendee {
                    email: attendee.email.clone(),
                    display_name: attendee.display_name.clone(),
                })
                .collect(),
            location: payload.location.clone(),
            color_id: payload.color_tag.clone(),
            reminders,
            extended_properties: Some(GoogleExtendedProperties { private }),
        }
    }
}

/// Event start/end: either a timed `dateTime` or an all-day `date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl GoogleEventTime {
    fn timed(instant: DateTime<Utc>, time_zone: &str) -> Self {
        Self {
            date_time: Some(instant.to_rfc3339()),
            time_zone: Some(time_zone.to_string()),
            date: None,
        }
    }

    /// Resolve to a UTC instant. All-day dates resolve to midnight UTC.
    pub fn to_utc(&self, field: &str) -> Result<DateTime<Utc>> {
        if let Some(date_time) = &self.date_time {
            return parse_rfc3339_utc(date_time, field);
        }
        if let Some(date) = &self.date {
            let naive = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                AgendaSyncError::Internal(format!("invalid all-day {field} date '{date}': {e}"))
            })?;
            let midnight = naive.and_hms_opt(0, 0, 0).ok_or_else(|| {
                AgendaSyncError::Internal(format!("invalid all-day {field} date '{date}'"))
            })?;
            return Ok(midnight.and_utc());
        }
        Err(AgendaSyncError::Internal(format!("event {field} carries neither dateTime nor date")))
    }
}

/// Parse an RFC 3339 timestamp, normalizing to UTC.
pub fn parse_rfc3339_utc(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            AgendaSyncError::Internal(format!("invalid {field} timestamp '{value}': {e}"))
        })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAttendee {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleReminders {
    pub use_default: bool,
    pub overrides: Vec<GoogleReminderOverride>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleReminderOverride {
    pub method: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleExtendedProperties {
    pub private: BTreeMap<String, String>,
}

/// Minimal shape of an insert response; only the assigned id is consumed.
#[derive(Debug, Deserialize)]
pub struct GoogleEventRef {
    pub id: String,
}

/// Event resource returned by list calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventResource {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub start: GoogleEventTime,
    pub end: GoogleEventTime,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Option<Vec<GoogleAttendee>>,
    #[serde(default)]
    pub html_link: Option<String>,
}

impl GoogleEventResource {
    /// Convert into the engine-side transient event representation.
    pub fn into_calendar_event(self) -> Result<CalendarEvent> {
        let start = self.start.to_utc("start")?;
        let end = self.end.to_utc("end")?;

        Ok(CalendarEvent {
            external_id: self.id,
            title: self.summary.unwrap_or_else(|| "(untitled)".to_string()),
            description: self.description,
            start,
            end,
            time_zone: self.start.time_zone,
            attendees: self
                .attendees
                .unwrap_or_default()
                .into_iter()
                .map(|attendee| EventAttendee {
                    email: attendee.email,
                    display_name: attendee.display_name,
                })
                .collect(),
            location: self.location,
            html_link: self.html_link,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventsListResponse {
    #[serde(default)]
    pub items: Vec<GoogleEventResource>,
}

/* -------------------------------------------------------------------------- */
/* Free/busy */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyRequest {
    pub time_min: String,
    pub time_max: String,
    pub items: Vec<FreeBusyRequestItem>,
}

#[derive(Debug, Serialize)]
pub struct FreeBusyRequestItem {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct FreeBusyResponse {
    #[serde(default)]
    pub calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
pub struct FreeBusyCalendar {
    #[serde(default)]
    pub busy: Vec<FreeBusyPeriod>,
}

#[derive(Debug, Deserialize)]
pub struct FreeBusyPeriod {
    pub start: String,
    pub end: String,
}

/* -------------------------------------------------------------------------- */
/* OAuth token endpoint */
/* -------------------------------------------------------------------------- */

/// Standard OAuth 2.0 token response (RFC 6749).
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Standard OAuth 2.0 error response (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
pub struct OAuthErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Calendar API error envelope.
#[derive(Debug, Deserialize)]
pub struct GoogleApiErrorEnvelope {
    pub error: GoogleApiError,
}

#[derive(Debug, Deserialize)]
pub struct GoogleApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    //! Wire-contract tests for the serde mappings.
    use agendasync_domain::EventReminder;
    use chrono::TimeZone;

    use super::*;

    fn payload() -> EventPayload {
        EventPayload {
            title: "Physiotherapy - Ana Souza".into(),
            description: Some("Patient: Ana Souza".into()),
            start: Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap(),
            time_zone: "America/Sao_Paulo".into(),
            attendees: vec![EventAttendee {
                email: "ana@example.com".into(),
                display_name: Some("Ana Souza".into()),
            }],
            location: Some("Room 2".into()),
            color_tag: None,
            reminders: EventReminder::defaults(),
            appointment_id: "appt-1".into(),
        }
    }

    #[test]
    fn event_body_matches_provider_contract() {
        let body = GoogleEventBody::from(&payload());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["summary"], "Physiotherapy - Ana Souza");
        assert_eq!(json["start"]["timeZone"], "America/Sao_Paulo");
        assert!(json["start"]["dateTime"].as_str().unwrap().starts_with("2026-03-02T14:00:00"));
        assert_eq!(json["attendees"][0]["email"], "ana@example.com");
        assert_eq!(json["attendees"][0]["displayName"], "Ana Souza");
        assert_eq!(json["reminders"]["useDefault"], false);
        assert_eq!(json["reminders"]["overrides"][0]["minutes"], 1440);
        assert_eq!(json["extendedProperties"]["private"]["appointmentId"], "appt-1");
        assert_eq!(json["extendedProperties"]["private"]["source"], "agendasync");
        // No colorId and no all-day date serialized when unset.
        assert!(json.get("colorId").is_none());
        assert!(json["start"].get("date").is_none());
    }

    #[test]
    fn all_day_resource_resolves_to_midnight_utc() {
        let time = GoogleEventTime {
            date_time: None,
            time_zone: None,
            date: Some("2026-03-02".into()),
        };
        let instant = time.to_utc("start").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn timed_resource_normalizes_offsets_to_utc() {
        let time = GoogleEventTime {
            date_time: Some("2026-03-02T14:00:00-03:00".into()),
            time_zone: Some("America/Sao_Paulo".into()),
            date: None,
        };
        let instant = time.to_utc("start").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2026, 3, 2, 17, 0, 0).unwrap());
    }

    #[test]
    fn event_time_without_fields_is_rejected() {
        let time = GoogleEventTime { date_time: None, time_zone: None, date: None };
        assert!(time.to_utc("start").is_err());
    }

    #[test]
    fn list_response_tolerates_missing_items() {
        let response: GoogleEventsListResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
    }
}
