//! Sync orchestrator - appointment mirror state machine
//!
//! Given one appointment plus its current external-event linkage, decides
//! create/update/delete, calls the calendar provider, and persists the
//! updated linkage. Provider failures never abort the appointment itself:
//! they are recorded on the sync record and returned in the outcome.

use std::sync::Arc;

use agendasync_domain::{
    AgendaSyncError, AppointmentSnapshot, AppointmentSyncRecord, Result, SyncAction, SyncFailure,
    SyncOutcome,
};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::event::build_event_payload;
use super::ports::{CalendarApi, SyncRecordRepository};
use crate::auth::CredentialManager;

/// Orchestrates synchronization of single appointments.
///
/// Sync operations for the same appointment are serialized through a
/// per-appointment async mutex, so a duplicate request queues behind the
/// in-flight one instead of racing it into a duplicate create.
pub struct SyncOrchestrator {
    calendar: Arc<dyn CalendarApi>,
    credentials: Arc<CredentialManager>,
    records: Arc<dyn SyncRecordRepository>,
    calendar_id: String,
    time_zone: String,
    appointment_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SyncOrchestrator {
    /// Create a new orchestrator writing to the given calendar.
    pub fn new(
        calendar: Arc<dyn CalendarApi>,
        credentials: Arc<CredentialManager>,
        records: Arc<dyn SyncRecordRepository>,
        calendar_id: impl Into<String>,
        time_zone: impl Into<String>,
    ) -> Self {
        Self {
            calendar,
            credentials,
            records,
            calendar_id: calendar_id.into(),
            time_zone: time_zone.into(),
            appointment_locks: DashMap::new(),
        }
    }

    /// Synchronize one appointment's calendar mirror.
    ///
    /// Returns `Err` only for persistence failures (credential or sync-record
    /// store); every provider failure is captured in the outcome.
    #[instrument(skip(self, snapshot), fields(appointment_id = %snapshot.appointment_id))]
    pub async fn sync_appointment(&self, snapshot: &AppointmentSnapshot) -> Result<SyncOutcome> {
        let lock = self.appointment_lock(&snapshot.appointment_id);
        let _guard = lock.lock().await;

        let existing = self.records.find_by_appointment(&snapshot.appointment_id).await?;
        let mut record = existing.unwrap_or_else(|| {
            AppointmentSyncRecord::pending(
                &snapshot.appointment_id,
                snapshot.external_event_id.clone(),
            )
        });

        let action = resolve_action(snapshot, &record);
        debug!(?action, "resolved sync action");

        if action == SyncAction::None {
            // Mirror already absent; nothing to call and nothing worth
            // persisting for an appointment the engine never touched.
            return Ok(ok_outcome(&record, SyncAction::None));
        }

        let owner_id = snapshot.professional_email.as_str();

        if !self.credentials.is_connected(owner_id).await? {
            let err = AgendaSyncError::CredentialMissing(format!(
                "no calendar credential stored for {owner_id}"
            ));
            let failure = SyncFailure {
                code: err.code().to_string(),
                message: "Google Calendar not connected; connect your calendar in settings"
                    .to_string(),
                retryable: false,
            };
            record.mark_error(&failure.message);
            self.records.upsert(&record).await?;
            warn!(owner_id, "sync skipped: no calendar credential");
            return Ok(failed_outcome(&record, action, failure));
        }

        let access_token = match self.credentials.get_valid_access_token(owner_id).await {
            Ok(token) => token,
            Err(err) => return self.record_failure(record, action, err).await,
        };

        let payload = build_event_payload(snapshot, &self.time_zone);

        let result = match action {
            SyncAction::Create => self
                .calendar
                .create_event(&access_token, &self.calendar_id, &payload)
                .await
                .map(Some),
            SyncAction::Update => {
                // Linkage presence was established during action resolution.
                let external_id = record.external_event_id.clone().ok_or_else(|| {
                    AgendaSyncError::Internal("update resolved without linkage".to_string())
                })?;
                self.calendar
                    .update_event(&access_token, &self.calendar_id, &external_id, &payload)
                    .await
                    .map(|()| Some(external_id))
            }
            SyncAction::Delete => {
                let external_id = record.external_event_id.clone().ok_or_else(|| {
                    AgendaSyncError::Internal("delete resolved without linkage".to_string())
                })?;
                self.calendar
                    .delete_event(&access_token, &self.calendar_id, &external_id)
                    .await
                    .map(|()| None)
            }
            // Handled above; kept for exhaustiveness.
            SyncAction::None => return Ok(ok_outcome(&record, SyncAction::None)),
        };

        match result {
            Ok(external_event_id) => {
                record.mark_synced(external_event_id);
                self.records.upsert(&record).await?;
                info!(?action, external_event_id = ?record.external_event_id, "appointment synced");
                Ok(ok_outcome(&record, action))
            }
            Err(err) => self.record_failure(record, action, err).await,
        }
    }

    /// Record a provider or token failure on the sync record.
    ///
    /// The external linkage is left untouched: on auth failures the external
    /// state is unknown, not confirmed deleted. Store failures propagate.
    async fn record_failure(
        &self,
        mut record: AppointmentSyncRecord,
        action: SyncAction,
        err: AgendaSyncError,
    ) -> Result<SyncOutcome> {
        if matches!(err, AgendaSyncError::Database(_)) {
            return Err(err);
        }

        let message = user_facing_message(&err);
        let failure = SyncFailure {
            code: err.code().to_string(),
            message,
            retryable: err.is_retryable(),
        };

        record.mark_error(&failure.message);
        self.records.upsert(&record).await?;
        warn!(code = %failure.code, ?action, "appointment sync failed");
        Ok(failed_outcome(&record, action, failure))
    }

    fn appointment_lock(&self, appointment_id: &str) -> Arc<Mutex<()>> {
        self.appointment_locks
            .entry(appointment_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Resolve the sync action from the appointment status and current linkage.
fn resolve_action(snapshot: &AppointmentSnapshot, record: &AppointmentSyncRecord) -> SyncAction {
    match (snapshot.status.is_active(), record.external_event_id.is_some()) {
        (true, false) => SyncAction::Create,
        (true, true) => SyncAction::Update,
        (false, true) => SyncAction::Delete,
        (false, false) => SyncAction::None,
    }
}

fn user_facing_message(err: &AgendaSyncError) -> String {
    match err {
        AgendaSyncError::AuthExpired(_) => {
            "calendar authorization expired; reconnect your calendar".to_string()
        }
        AgendaSyncError::Transient(_) => {
            "temporary calendar provider failure; sync will be retried".to_string()
        }
        other => other.to_string(),
    }
}

fn ok_outcome(record: &AppointmentSyncRecord, action: SyncAction) -> SyncOutcome {
    SyncOutcome {
        appointment_id: record.appointment_id.clone(),
        action,
        external_event_id: record.external_event_id.clone(),
        error: None,
    }
}

fn failed_outcome(
    record: &AppointmentSyncRecord,
    action: SyncAction,
    failure: SyncFailure,
) -> SyncOutcome {
    SyncOutcome {
        appointment_id: record.appointment_id.clone(),
        action,
        external_event_id: record.external_event_id.clone(),
        error: Some(failure),
    }
}
