//! Availability engine
//!
//! Turns raw busy intervals into maximal disjoint intervals and searches for
//! open slots under work-hour and duration constraints. The interval
//! algorithms are pure; `AvailabilityService` wires them to the calendar
//! provider and credential manager.

use std::sync::Arc;

use agendasync_domain::{
    constants::PRIMARY_CALENDAR_ID, AvailabilityQuery, BusyInterval, Result,
};
use chrono::{DateTime, Datelike, Timelike, Utc};
use tracing::{debug, instrument};

use crate::auth::CredentialManager;
use crate::sync::ports::CalendarApi;

/// Merge raw busy intervals into sorted, maximal disjoint intervals.
///
/// Standard interval merge: sort by start, then extend the current interval
/// while the next one starts at or before its end. Adjacent intervals
/// coalesce; empty intervals are discarded.
#[must_use]
pub fn merge_busy_intervals(mut intervals: Vec<BusyInterval>) -> Vec<BusyInterval> {
    intervals.retain(|interval| !interval.is_empty());
    intervals.sort_by_key(|interval| interval.start);

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(current) if interval.start <= current.end => {
                if interval.end > current.end {
                    current.end = interval.end;
                }
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Search for open slot start times.
///
/// Candidates run from `time_min` to `time_max` in `step_minutes`
/// increments. A candidate is kept when its hour-of-day (in the query's
/// reference zone) lies within the work window, the slot end stays inside
/// both the work window and the queried range, and no busy interval overlaps
/// it. Intervals are half-open, so a slot touching a busy boundary does not
/// conflict.
#[must_use]
pub fn find_slots(query: &AvailabilityQuery, busy: &[BusyInterval]) -> Vec<DateTime<Utc>> {
    let mut slots = Vec::new();
    if query.duration_minutes == 0
        || query.step_minutes == 0
        || query.work_start_hour >= query.work_end_hour
    {
        return slots;
    }

    let step = chrono::Duration::minutes(i64::from(query.step_minutes));
    let duration = chrono::Duration::minutes(i64::from(query.duration_minutes));

    let mut candidate = query.time_min;
    while candidate < query.time_max {
        let slot_end = candidate + duration;
        if slot_end > query.time_max {
            break;
        }

        if fits_work_window(candidate, slot_end, query)
            && !busy.iter().any(|interval| interval.overlaps(candidate, slot_end))
        {
            slots.push(candidate);
        }

        candidate += step;
    }

    slots
}

/// Work-window check in the query's reference time zone.
fn fits_work_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    query: &AvailabilityQuery,
) -> bool {
    let local_start = start.with_timezone(&query.time_zone);
    let hour = local_start.hour();
    if hour < query.work_start_hour || hour >= query.work_end_hour {
        return false;
    }

    let local_end = end.with_timezone(&query.time_zone);
    if local_end.date_naive() == local_start.date_naive() {
        let end_minutes = local_end.hour() * 60 + local_end.minute();
        end_minutes <= query.work_end_hour * 60
    } else {
        // A slot may cross midnight only when the window runs to midnight
        // and the slot ends exactly there.
        query.work_end_hour >= 24
            && local_end.time() == chrono::NaiveTime::MIN
            && local_end.num_days_from_ce() == local_start.num_days_from_ce() + 1
    }
}

/// Read-only availability queries against the provider's free/busy API.
pub struct AvailabilityService {
    calendar: Arc<dyn CalendarApi>,
    credentials: Arc<CredentialManager>,
}

impl AvailabilityService {
    /// Create a new availability service.
    pub fn new(calendar: Arc<dyn CalendarApi>, credentials: Arc<CredentialManager>) -> Self {
        Self { calendar, credentials }
    }

    /// Merged busy intervals across the query's calendars.
    #[instrument(skip(self, query))]
    pub async fn compute_busy(
        &self,
        owner_id: &str,
        query: &AvailabilityQuery,
    ) -> Result<Vec<BusyInterval>> {
        let access_token = self.credentials.get_valid_access_token(owner_id).await?;

        let calendar_ids = if query.calendar_ids.is_empty() {
            vec![PRIMARY_CALENDAR_ID.to_string()]
        } else {
            query.calendar_ids.clone()
        };

        let by_calendar = self
            .calendar
            .free_busy(&access_token, &calendar_ids, query.time_min, query.time_max)
            .await?;

        let raw: Vec<BusyInterval> = by_calendar.into_values().flatten().collect();
        let merged = merge_busy_intervals(raw);
        debug!(owner_id, intervals = merged.len(), "computed busy intervals");
        Ok(merged)
    }

    /// Open slot start times for a booking query.
    #[instrument(skip(self, query))]
    pub async fn find_available_slots(
        &self,
        owner_id: &str,
        query: &AvailabilityQuery,
    ) -> Result<Vec<DateTime<Utc>>> {
        let busy = self.compute_busy(owner_id, query).await?;
        Ok(find_slots(query, &busy))
    }
}
