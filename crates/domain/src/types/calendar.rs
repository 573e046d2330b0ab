//! Calendar-facing types
//!
//! Provider-shaped event content, busy intervals, and availability queries.
//! None of these are persisted by the engine; events are constructed on
//! demand and busy intervals are derived from free/busy responses.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_STEP_MINUTES, REMINDER_LEAD_MINUTES};

/// Event attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttendee {
    pub email: String,
    pub display_name: Option<String>,
}

/// Reminder override attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventReminder {
    /// Delivery method, e.g. "email" or "popup".
    pub method: String,
    /// Lead time in minutes before the event start.
    pub minutes: u32,
}

impl EventReminder {
    /// Default reminder set: email 24 hours and 1 hour before the start.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        REMINDER_LEAD_MINUTES
            .iter()
            .map(|minutes| Self { method: "email".to_string(), minutes: *minutes })
            .collect()
    }
}

/// Outbound event content sent to the provider on create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA time zone name attached to the wire payload.
    pub time_zone: String,
    pub attendees: Vec<EventAttendee>,
    pub location: Option<String>,
    pub color_tag: Option<String>,
    pub reminders: Vec<EventReminder>,
    /// Internal appointment id stamped into the event's private extended
    /// properties for correlation.
    pub appointment_id: String,
}

/// Event read back from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: Option<String>,
    pub attendees: Vec<EventAttendee>,
    pub location: Option<String>,
    pub html_link: Option<String>,
}

/// Busy time range, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// General overlap test against a candidate range, covering all four
    /// overlap shapes. Half-open semantics: touching boundaries do not
    /// conflict.
    #[must_use]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }

    /// An interval with no duration (or negative duration) is meaningless.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Input value object for availability computation and slot search.
#[derive(Debug, Clone)]
pub struct AvailabilityQuery {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    pub duration_minutes: u32,
    /// First bookable hour of day, evaluated in `time_zone`.
    pub work_start_hour: u32,
    /// Exclusive last hour of day; slots must end by this boundary.
    pub work_end_hour: u32,
    pub step_minutes: u32,
    pub calendar_ids: Vec<String>,
    /// Single reference zone for hour-of-day evaluation. All instants are
    /// normalized to UTC before interval comparison.
    pub time_zone: Tz,
}

impl AvailabilityQuery {
    /// Query with default work hours (08-18), the default step, and the UTC
    /// reference zone.
    #[must_use]
    pub fn new(time_min: DateTime<Utc>, time_max: DateTime<Utc>, duration_minutes: u32) -> Self {
        Self {
            time_min,
            time_max,
            duration_minutes,
            work_start_hour: 8,
            work_end_hour: 18,
            step_minutes: DEFAULT_STEP_MINUTES,
            calendar_ids: Vec::new(),
            time_zone: chrono_tz::UTC,
        }
    }

    #[must_use]
    pub fn with_work_hours(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.work_start_hour = start_hour;
        self.work_end_hour = end_hour;
        self
    }

    #[must_use]
    pub fn with_step_minutes(mut self, step_minutes: u32) -> Self {
        self.step_minutes = step_minutes;
        self
    }

    #[must_use]
    pub fn with_calendars(mut self, calendar_ids: Vec<String>) -> Self {
        self.calendar_ids = calendar_ids;
        self
    }

    #[must_use]
    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }
}
