//! Shared context for integration tests that need direct database access.
#![allow(dead_code)] // not every test crate uses every helper

use std::sync::Arc;
use std::time::Duration;

use agendasync_domain::OAuthCredential;
use agendasync_infra::{
    DbManager, HttpClient, SqliteCredentialStore, SqliteSyncRecordRepository,
};
use chrono::Utc;
use tempfile::TempDir;

/// Shared context with fresh SQLite database state.
pub struct TestContext {
    pub db: Arc<DbManager>,
    /// Credential store under test.
    pub credential_store: Arc<SqliteCredentialStore>,
    /// Sync-record repository under test.
    pub sync_records: Arc<SqliteSyncRecordRepository>,
    /// Keep temporary directory alive for the lifetime of the context.
    _temp_dir: TempDir,
}

/// Create a new test context with a migrated scratch database.
pub fn setup_test_context() -> TestContext {
    let temp_dir = TempDir::new().expect("failed to create temporary database directory");
    let db_path = temp_dir.path().join("agendasync.db");

    let db = Arc::new(DbManager::new(&db_path, 4).expect("failed to initialise sqlite manager"));
    db.run_migrations().expect("failed to run schema migrations");

    let credential_store = Arc::new(SqliteCredentialStore::new(Arc::clone(&db)));
    let sync_records = Arc::new(SqliteSyncRecordRepository::new(Arc::clone(&db)));

    TestContext { db, credential_store, sync_records, _temp_dir: temp_dir }
}

/// HTTP client with a single attempt, so status-mapping tests observe the
/// raw provider response instead of retry behaviour.
pub fn single_attempt_client() -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .max_attempts(1)
        .build()
        .expect("http client")
}

/// HTTP client with fast retries for retry-behaviour tests.
pub fn retrying_client(attempts: usize) -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .max_attempts(attempts)
        .base_backoff(Duration::from_millis(10))
        .build()
        .expect("http client")
}

/// Credential expiring the given number of seconds from now.
pub fn credential(owner_id: &str, expires_in_seconds: i64) -> OAuthCredential {
    OAuthCredential {
        owner_id: owner_id.to_string(),
        access_token: "access-stored".into(),
        refresh_token: "refresh-stored".into(),
        expires_at: Utc::now() + chrono::Duration::seconds(expires_in_seconds),
        scopes: vec![
            "https://www.googleapis.com/auth/calendar".into(),
            "https://www.googleapis.com/auth/calendar.events".into(),
        ],
        redirect_uri: "https://app.clinic.test/callback".into(),
    }
}
