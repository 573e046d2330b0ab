//! Engine composition
//!
//! Wires configuration into a ready-to-use engine: pooled database, Google
//! adapters, credential manager, orchestrator, batch coordinator, and
//! availability service. Everything is explicitly constructed and injected;
//! there is no global client state.

use std::sync::Arc;
use std::time::Duration;

use agendasync_core::{
    AvailabilityService, BatchCoordinator, CalendarApi, CredentialManager, SyncOrchestrator,
};
use agendasync_domain::{AvailabilityQuery, EngineConfig, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::parse_time_zone;
use crate::database::{DbManager, SqliteCredentialStore, SqliteSyncRecordRepository};
use crate::google::{authorization_url, GoogleCalendarClient, GoogleOAuthClient};
use crate::http::HttpClient;

/// Assembled calendar synchronization engine.
pub struct Engine {
    pub credentials: Arc<CredentialManager>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub batch: BatchCoordinator,
    pub availability: AvailabilityService,
    pub db: Arc<DbManager>,
    config: EngineConfig,
}

impl Engine {
    /// Build the engine from configuration.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        crate::config::validate(&config)?;

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.sync.http_timeout_seconds))
            .max_attempts(config.sync.max_attempts)
            .build()?;

        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let credential_store = Arc::new(SqliteCredentialStore::new(Arc::clone(&db)));
        let token_endpoint = Arc::new(GoogleOAuthClient::new(http.clone(), &config.google));
        let credentials = Arc::new(
            CredentialManager::new(credential_store, token_endpoint)
                .with_refresh_skew(config.sync.refresh_skew_seconds),
        );

        let calendar: Arc<dyn CalendarApi> = Arc::new(GoogleCalendarClient::new(http));
        let records = Arc::new(SqliteSyncRecordRepository::new(Arc::clone(&db)));

        let orchestrator = Arc::new(SyncOrchestrator::new(
            Arc::clone(&calendar),
            Arc::clone(&credentials),
            records,
            config.google.calendar_id.clone(),
            config.availability.time_zone.clone(),
        ));

        let batch = BatchCoordinator::new(Arc::clone(&orchestrator))
            .with_concurrency(config.sync.batch_concurrency);
        let availability = AvailabilityService::new(calendar, Arc::clone(&credentials));

        info!(calendar_id = %config.google.calendar_id, "engine assembled");

        Ok(Self { credentials, orchestrator, batch, availability, db, config })
    }

    /// Provider consent URL for a user; `state` carries the internal user id.
    pub fn authorization_url(&self, user_id: &str) -> Result<String> {
        authorization_url(&self.config.google, user_id)
    }

    /// Availability query pre-filled with the configured work hours, step,
    /// and reference time zone.
    pub fn booking_query(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<AvailabilityQuery> {
        let availability = &self.config.availability;
        Ok(AvailabilityQuery::new(time_min, time_max, duration_minutes)
            .with_work_hours(availability.work_start_hour, availability.work_end_hour)
            .with_step_minutes(availability.step_minutes)
            .with_time_zone(parse_time_zone(&availability.time_zone)?))
    }

    /// The configuration the engine was built from.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for engine assembly.
    use chrono::TimeZone;

    use super::*;

    fn test_config(db_path: &std::path::Path) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.google.client_id = "client-123".into();
        config.google.client_secret = "secret".into();
        config.google.redirect_uri = "https://app.clinic.test/callback".into();
        config.database.path = db_path.to_string_lossy().into_owned();
        config.availability.work_start_hour = 9;
        config.availability.work_end_hour = 17;
        config.availability.time_zone = "America/Sao_Paulo".into();
        config
    }

    #[test]
    fn builds_engine_and_migrates_database() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::from_config(test_config(&dir.path().join("engine.db"))).unwrap();

        engine.db.health_check().unwrap();
    }

    #[test]
    fn rejects_invalid_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir.path().join("engine.db"));
        config.google.client_id.clear();

        assert!(Engine::from_config(config).is_err());
    }

    #[test]
    fn booking_query_uses_configured_window() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::from_config(test_config(&dir.path().join("engine.db"))).unwrap();

        let time_min = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let time_max = Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap();
        let query = engine.booking_query(time_min, time_max, 60).unwrap();

        assert_eq!(query.work_start_hour, 9);
        assert_eq!(query.work_end_hour, 17);
        assert_eq!(query.time_zone, chrono_tz::America::Sao_Paulo);
    }

    #[test]
    fn consent_url_embeds_the_user_state() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::from_config(test_config(&dir.path().join("engine.db"))).unwrap();

        let url = engine.authorization_url("user-42").unwrap();
        assert!(url.contains("state=user-42"));
        assert!(url.contains("access_type=offline"));
    }
}
