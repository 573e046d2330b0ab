//! In-memory port implementations shared by this crate's tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use agendasync_domain::{
    AgendaSyncError, AppointmentSyncRecord, BusyInterval, CalendarEvent, EventPayload,
    OAuthCredential, Result, TokenGrant,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::auth::ports::{CredentialStore, TokenEndpoint};
use crate::sync::ports::{CalendarApi, SyncRecordRepository};

/// Credential with an hour of validity for the given owner.
pub fn valid_credential(owner_id: &str) -> OAuthCredential {
    OAuthCredential {
        owner_id: owner_id.to_string(),
        access_token: "access-valid".into(),
        refresh_token: "refresh-valid".into(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
        scopes: vec!["https://www.googleapis.com/auth/calendar".into()],
        redirect_uri: "https://app.clinic.test/callback".into(),
    }
}

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<HashMap<String, OAuthCredential>>,
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self, owner_id: &str) -> Result<Option<OAuthCredential>> {
        Ok(self.credentials.read().await.get(owner_id).cloned())
    }

    async fn upsert(&self, credential: &OAuthCredential) -> Result<()> {
        self.credentials
            .write()
            .await
            .insert(credential.owner_id.clone(), credential.clone());
        Ok(())
    }

    async fn delete(&self, owner_id: &str) -> Result<()> {
        self.credentials.write().await.remove(owner_id);
        Ok(())
    }
}

/// Scripted token endpoint counting refresh calls.
pub struct StubTokenEndpoint {
    access_token: String,
    rotated_refresh_token: Option<String>,
    failure: Option<AgendaSyncError>,
    delay: Option<Duration>,
    refresh_calls: AtomicUsize,
    exchange_calls: AtomicUsize,
}

impl StubTokenEndpoint {
    /// Endpoint that always grants the given tokens.
    pub fn granting(access_token: &str, rotated_refresh_token: Option<&str>) -> Self {
        Self {
            access_token: access_token.to_string(),
            rotated_refresh_token: rotated_refresh_token.map(str::to_string),
            failure: None,
            delay: None,
            refresh_calls: AtomicUsize::new(0),
            exchange_calls: AtomicUsize::new(0),
        }
    }

    /// Endpoint that always fails with the given error.
    pub fn failing(error: AgendaSyncError) -> Self {
        Self {
            access_token: String::new(),
            rotated_refresh_token: None,
            failure: Some(error),
            delay: None,
            refresh_calls: AtomicUsize::new(0),
            exchange_calls: AtomicUsize::new(0),
        }
    }

    /// Add latency to every call, for concurrency tests.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<TokenGrant> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(TokenGrant::new(
            self.access_token.clone(),
            self.rotated_refresh_token.clone(),
            3600,
            Vec::new(),
        ))
    }
}

#[async_trait]
impl TokenEndpoint for StubTokenEndpoint {
    async fn exchange_code(&self, _code: &str, _redirect_uri: &str) -> Result<TokenGrant> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await
    }
}

/// In-memory sync record repository.
#[derive(Default)]
pub struct MemorySyncRecordRepository {
    records: RwLock<HashMap<String, AppointmentSyncRecord>>,
}

#[async_trait]
impl SyncRecordRepository for MemorySyncRecordRepository {
    async fn find_by_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentSyncRecord>> {
        Ok(self.records.read().await.get(appointment_id).cloned())
    }

    async fn upsert(&self, record: &AppointmentSyncRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.appointment_id.clone(), record.clone());
        Ok(())
    }
}

/// Scripted calendar provider counting calls per operation.
#[derive(Default)]
pub struct MockCalendarApi {
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    next_event_id: AtomicUsize,
    fail_next_create: Mutex<Option<AgendaSyncError>>,
    fail_next_update: Mutex<Option<AgendaSyncError>>,
    create_failures_by_appointment: Mutex<HashMap<String, AgendaSyncError>>,
    busy_by_calendar: Mutex<HashMap<String, Vec<BusyInterval>>>,
    delay: Option<Duration>,
}

impl MockCalendarApi {
    /// Add latency to create calls, for concurrency tests.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_next_create(&self, error: AgendaSyncError) {
        *self.fail_next_create.lock().unwrap() = Some(error);
    }

    pub fn fail_next_update(&self, error: AgendaSyncError) {
        *self.fail_next_update.lock().unwrap() = Some(error);
    }

    /// Fail every create for a specific appointment id.
    pub fn fail_create_for(&self, appointment_id: &str, error: AgendaSyncError) {
        self.create_failures_by_appointment
            .lock()
            .unwrap()
            .insert(appointment_id.to_string(), error);
    }

    pub fn set_busy(&self, calendar_id: &str, intervals: Vec<BusyInterval>) {
        self.busy_by_calendar.lock().unwrap().insert(calendar_id.to_string(), intervals);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarApi for MockCalendarApi {
    async fn create_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        payload: &EventPayload,
    ) -> Result<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.fail_next_create.lock().unwrap().take() {
            return Err(err);
        }
        if let Some(err) =
            self.create_failures_by_appointment.lock().unwrap().get(&payload.appointment_id)
        {
            return Err(err.clone());
        }
        let n = self.next_event_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("evt-{n}"))
    }

    async fn update_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _external_id: &str,
        _payload: &EventPayload,
    ) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_next_update.lock().unwrap().take() {
            return Err(err);
        }
        Ok(())
    }

    async fn delete_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _external_id: &str,
    ) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_events(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        Ok(Vec::new())
    }

    async fn free_busy(
        &self,
        _access_token: &str,
        calendar_ids: &[String],
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> Result<HashMap<String, Vec<BusyInterval>>> {
        let busy = self.busy_by_calendar.lock().unwrap();
        Ok(calendar_ids
            .iter()
            .map(|id| (id.clone(), busy.get(id).cloned().unwrap_or_default()))
            .collect())
    }
}
