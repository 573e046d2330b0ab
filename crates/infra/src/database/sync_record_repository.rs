//! SQLite-backed implementation of the SyncRecordRepository port.

use std::sync::Arc;

use agendasync_core::SyncRecordRepository;
use agendasync_domain::{
    AgendaSyncError, AppointmentSyncRecord, Result, SyncState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, ToSql};
use tracing::{debug, instrument};

use super::manager::DbManager;
use crate::errors::InfraError;

/// SQLite implementation of the sync-record repository.
pub struct SqliteSyncRecordRepository {
    db: Arc<DbManager>,
}

impl SqliteSyncRecordRepository {
    /// Create a new sync-record repository.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SyncRecordRepository for SqliteSyncRecordRepository {
    #[instrument(skip(self))]
    async fn find_by_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentSyncRecord>> {
        let conn = self.db.get_connection()?;

        let row = conn
            .query_row(
                "SELECT id, appointment_id, external_event_id, sync_state, last_sync_at,
                        error_message
                 FROM appointment_sync_records
                 WHERE appointment_id = ?1",
                [&appointment_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(InfraError::from)?;

        let Some((id, appointment_id, external_event_id, state, last_sync_ts, error_message)) =
            row
        else {
            return Ok(None);
        };

        let sync_state = SyncState::parse(&state).ok_or_else(|| {
            AgendaSyncError::Database(format!("invalid stored sync state: {state}"))
        })?;
        let last_sync_at = last_sync_ts.map(timestamp_to_datetime).transpose()?;

        Ok(Some(AppointmentSyncRecord {
            id,
            appointment_id,
            external_event_id,
            sync_state,
            last_sync_at,
            error_message,
        }))
    }

    #[instrument(skip(self, record), fields(appointment_id = %record.appointment_id))]
    async fn upsert(&self, record: &AppointmentSyncRecord) -> Result<()> {
        let conn = self.db.get_connection()?;
        let now = Utc::now().timestamp();
        let last_sync_ts = record.last_sync_at.map(|at| at.timestamp());

        conn.execute(
            "INSERT INTO appointment_sync_records (
                id, appointment_id, external_event_id, sync_state, last_sync_at,
                error_message, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(appointment_id) DO UPDATE SET
                external_event_id = excluded.external_event_id,
                sync_state = excluded.sync_state,
                last_sync_at = excluded.last_sync_at,
                error_message = excluded.error_message,
                updated_at = excluded.updated_at",
            [
                &record.id as &dyn ToSql,
                &record.appointment_id,
                &record.external_event_id,
                &record.sync_state.as_str(),
                &last_sync_ts,
                &record.error_message,
                &now,
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        debug!(state = record.sync_state.as_str(), "sync record upserted");
        Ok(())
    }
}

fn timestamp_to_datetime(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| AgendaSyncError::Database(format!("invalid stored timestamp: {ts}")))
}
