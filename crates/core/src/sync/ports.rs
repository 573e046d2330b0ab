//! Calendar provider and sync-record port interfaces

use std::collections::HashMap;

use agendasync_domain::{
    AppointmentSyncRecord, BusyInterval, CalendarEvent, EventPayload, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Stateless calendar provider port.
///
/// Every call takes the access token explicitly; the adapter holds no
/// credential state. Provider 401 surfaces as `AuthExpired`, 429/5xx as
/// `Transient`, validation failures as `InvalidRequest`. "Event not found"
/// on update/delete is success-no-op, handled inside the adapter.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Create an event, returning the provider-assigned external id.
    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> Result<String>;

    /// Update an existing event. An already-deleted event is a no-op.
    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        external_id: &str,
        payload: &EventPayload,
    ) -> Result<()>;

    /// Delete an event. An already-deleted event is a no-op.
    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        external_id: &str,
    ) -> Result<()>;

    /// List events within a time range.
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Query opaque busy ranges per calendar.
    async fn free_busy(
        &self,
        access_token: &str,
        calendar_ids: &[String],
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<HashMap<String, Vec<BusyInterval>>>;
}

/// Persistence port for appointment sync records.
#[async_trait]
pub trait SyncRecordRepository: Send + Sync {
    /// Look up the record for an appointment.
    async fn find_by_appointment(&self, appointment_id: &str)
        -> Result<Option<AppointmentSyncRecord>>;

    /// Insert or replace the record for its appointment.
    async fn upsert(&self, record: &AppointmentSyncRecord) -> Result<()>;
}
