//! End-to-end sync flow: orchestrator + SQLite stores + mock provider.

mod support;

use std::sync::Arc;

use agendasync_core::{
    BatchCoordinator, CredentialManager, CredentialStore, SyncOrchestrator, SyncRecordRepository,
};
use agendasync_domain::{
    AppointmentSnapshot, AppointmentStatus, BatchStatus, GoogleConfig, SyncAction, SyncState,
};
use agendasync_infra::{GoogleCalendarClient, GoogleOAuthClient};
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{credential, retrying_client, setup_test_context, single_attempt_client};

const OWNER: &str = "lima@clinic.test";

fn snapshot(id: &str, status: AppointmentStatus) -> AppointmentSnapshot {
    AppointmentSnapshot {
        appointment_id: id.into(),
        patient_name: "Ana Souza".into(),
        patient_email: Some("ana@example.com".into()),
        professional_name: "Dr. Lima".into(),
        professional_email: OWNER.into(),
        start: Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap(),
        appointment_type: "Physiotherapy".into(),
        status,
        notes: None,
        location: Some("Room 2".into()),
        external_event_id: None,
    }
}

struct Stack {
    orchestrator: Arc<SyncOrchestrator>,
    ctx: support::TestContext,
}

async fn stack(server: &MockServer) -> Stack {
    let ctx = setup_test_context();

    let google_config = GoogleConfig {
        client_id: "client-123".into(),
        client_secret: "secret-456".into(),
        redirect_uri: "https://app.clinic.test/callback".into(),
        token_endpoint: format!("{}/token", server.uri()),
        ..GoogleConfig::default()
    };

    let credentials = Arc::new(CredentialManager::new(
        Arc::clone(&ctx.credential_store) as Arc<dyn CredentialStore>,
        Arc::new(GoogleOAuthClient::new(single_attempt_client(), &google_config)),
    ));

    let calendar =
        Arc::new(GoogleCalendarClient::with_api_base(retrying_client(2), server.uri()));

    let orchestrator = Arc::new(SyncOrchestrator::new(
        calendar,
        credentials,
        Arc::clone(&ctx.sync_records) as Arc<dyn SyncRecordRepository>,
        "primary",
        "UTC",
    ));

    Stack { orchestrator, ctx }
}

#[tokio::test]
async fn expired_credential_is_refreshed_before_the_event_is_created() {
    let server = MockServer::start().await;

    // Stored access token is stale; the engine must refresh first.
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-stored"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-fresh",
            "refresh_token": "refresh-rotated",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The created event must carry the refreshed token.
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer access-fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let stack = stack(&server).await;
    stack.ctx.credential_store.upsert(&credential(OWNER, -60)).await.unwrap();

    let outcome = stack
        .orchestrator
        .sync_appointment(&snapshot("appt-1", AppointmentStatus::Scheduled))
        .await
        .unwrap();

    assert!(outcome.succeeded());
    assert_eq!(outcome.action, SyncAction::Create);
    assert_eq!(outcome.external_event_id.as_deref(), Some("evt-1"));

    // Rotated refresh token was persisted with the fresh access token.
    let stored = stack.ctx.credential_store.load(OWNER).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "access-fresh");
    assert_eq!(stored.refresh_token, "refresh-rotated");

    let record = stack.ctx.sync_records.find_by_appointment("appt-1").await.unwrap().unwrap();
    assert_eq!(record.sync_state, SyncState::Synced);
    assert_eq!(record.external_event_id.as_deref(), Some("evt-1"));
}

#[tokio::test]
async fn create_then_cancel_round_trip_clears_linkage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt-9" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/calendars/primary/events/evt-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let stack = stack(&server).await;
    stack.ctx.credential_store.upsert(&credential(OWNER, 3600)).await.unwrap();

    stack
        .orchestrator
        .sync_appointment(&snapshot("appt-1", AppointmentStatus::Scheduled))
        .await
        .unwrap();
    let outcome = stack
        .orchestrator
        .sync_appointment(&snapshot("appt-1", AppointmentStatus::Cancelled))
        .await
        .unwrap();

    assert!(outcome.succeeded());
    assert_eq!(outcome.action, SyncAction::Delete);

    let record = stack.ctx.sync_records.find_by_appointment("appt-1").await.unwrap().unwrap();
    assert!(record.external_event_id.is_none());
    assert_eq!(record.sync_state, SyncState::Synced);
}

#[tokio::test]
async fn provider_rejecting_the_token_marks_the_record_for_reauth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": 401, "message": "Invalid Credentials" }
        })))
        .mount(&server)
        .await;

    let stack = stack(&server).await;
    stack.ctx.credential_store.upsert(&credential(OWNER, 3600)).await.unwrap();

    let outcome = stack
        .orchestrator
        .sync_appointment(&snapshot("appt-1", AppointmentStatus::Scheduled))
        .await
        .unwrap();

    let failure = outcome.error.unwrap();
    assert_eq!(failure.code, "unauthenticated");
    assert!(!failure.retryable);

    let record = stack.ctx.sync_records.find_by_appointment("appt-1").await.unwrap().unwrap();
    assert_eq!(record.sync_state, SyncState::Error);
}

#[tokio::test]
async fn disconnected_owner_never_reaches_the_provider() {
    let server = MockServer::start().await;
    let stack = stack(&server).await;

    let outcome = stack
        .orchestrator
        .sync_appointment(&snapshot("appt-1", AppointmentStatus::Scheduled))
        .await
        .unwrap();

    let failure = outcome.error.unwrap();
    assert_eq!(failure.code, "failed-precondition");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_reports_each_appointment_individually() {
    let server = MockServer::start().await;

    // appt-2's payload is rejected by the provider; mounted first so it
    // takes precedence over the generic success mock.
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(body_partial_json(json!({
            "extendedProperties": { "private": { "appointmentId": "appt-2" } }
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "Invalid attendee email" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt-ok" })))
        .mount(&server)
        .await;

    let stack = stack(&server).await;
    stack.ctx.credential_store.upsert(&credential(OWNER, 3600)).await.unwrap();

    let coordinator = BatchCoordinator::new(Arc::clone(&stack.orchestrator)).with_concurrency(2);
    let appointments: Vec<AppointmentSnapshot> = (1..=3)
        .map(|i| snapshot(&format!("appt-{i}"), AppointmentStatus::Scheduled))
        .collect();

    let results = coordinator.sync_many(&appointments).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].result, BatchStatus::Ok);
    assert_eq!(results[1].result, BatchStatus::Error);
    assert!(results[1].detail.as_deref().unwrap().contains("invalid-argument"));
    assert_eq!(results[2].result, BatchStatus::Ok);
}
