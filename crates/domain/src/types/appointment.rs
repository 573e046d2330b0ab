//! Appointment-facing types
//!
//! The engine consumes an [`AppointmentSnapshot`] supplied by the
//! surrounding application and owns one [`AppointmentSyncRecord`] per
//! appointment tracking its linkage to the external calendar event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Appointment lifecycle status as reported by the clinic application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Rescheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// An active appointment should be mirrored as a calendar event.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Scheduled | Self::Rescheduled)
    }
}

/// Appointment data handed to the engine by the collaborator layer.
///
/// The engine never queries patient or professional storage directly; the
/// caller resolves related records into this flat snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSnapshot {
    pub appointment_id: String,
    pub patient_name: String,
    pub patient_email: Option<String>,
    pub professional_name: String,
    /// Owner key for credential lookup.
    pub professional_email: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Appointment type label, e.g. "Physiotherapy session".
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub location: Option<String>,
    /// Pre-existing external linkage, used only to seed a first-time sync
    /// record for appointments linked before the engine owned the mapping.
    pub external_event_id: Option<String>,
}

/// Synchronization state of one appointment's calendar mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Pending,
    Synced,
    Error,
}

impl SyncState {
    /// Stable string form used for persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }

    /// Parse the persisted string form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "synced" => Some(Self::Synced),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Persistent record linking an appointment to its external calendar event.
///
/// `external_event_id` is set only after a successful create and cleared
/// only after a successful delete, so at most one live external event exists
/// per appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSyncRecord {
    pub id: String,
    pub appointment_id: String,
    pub external_event_id: Option<String>,
    pub sync_state: SyncState,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl AppointmentSyncRecord {
    /// Fresh record for an appointment's first sync attempt.
    #[must_use]
    pub fn pending(appointment_id: &str, external_event_id: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            appointment_id: appointment_id.to_string(),
            external_event_id,
            sync_state: SyncState::Pending,
            last_sync_at: None,
            error_message: None,
        }
    }

    /// Record a successful sync, updating the linkage.
    pub fn mark_synced(&mut self, external_event_id: Option<String>) {
        self.external_event_id = external_event_id;
        self.sync_state = SyncState::Synced;
        self.last_sync_at = Some(Utc::now());
        self.error_message = None;
    }

    /// Record a failed sync. The linkage is left untouched: on auth failures
    /// the external state is unknown, not confirmed deleted.
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.sync_state = SyncState::Error;
        self.error_message = Some(message.into());
    }
}

/// Action the orchestrator resolved for one appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Create,
    Update,
    Delete,
    None,
}

/// Per-appointment failure captured in a [`SyncOutcome`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFailure {
    /// RPC-style error code (`unauthenticated`, `unavailable`, ...).
    pub code: String,
    pub message: String,
    /// Whether the caller should retry, as opposed to prompting the user to
    /// reconnect their calendar.
    pub retryable: bool,
}

/// Result of synchronizing a single appointment.
///
/// Provider failures are reported here rather than raised; the appointment
/// stays fully usable in the clinic system with only its calendar mirror
/// stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub appointment_id: String,
    pub action: SyncAction,
    pub external_event_id: Option<String>,
    pub error: Option<SyncFailure>,
}

impl SyncOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Batch entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Ok,
    Error,
}

/// Per-item report returned by the batch coordinator so callers can retry
/// only the failed subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub appointment_id: String,
    pub result: BatchStatus,
    pub detail: Option<String>,
}
